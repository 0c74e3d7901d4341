#![allow(dead_code)]

pub mod scripted;

use std::sync::Arc;

use trivia_night_back::{
    config::{AppConfig, SeedQuestion},
    dao::{game_store::memory::MemoryStore, models::PlayerEntity},
    dto::{
        game::{GameSummary, QuestionSummary},
        host::{AddQuestionRequest, CreateGameRequest},
        player::{JoinRequest, SubmitAnswerRequest},
    },
    services::{host_service, player_service},
    state::{AppState, SharedState},
};
use uuid::Uuid;

use scripted::ScriptedStore;

pub const MASTER_PIN: &str = "9999";
pub const HOST_PIN: &str = "1234";

/// Application state over an in-memory store the test can reach into.
///
/// Every call goes through `script`, which does nothing until a test arms it.
pub struct Harness {
    pub state: SharedState,
    pub store: MemoryStore,
    pub script: Arc<ScriptedStore>,
}

pub fn harness() -> Harness {
    let store = MemoryStore::new();
    let config = AppConfig::new(MASTER_PIN).with_seed_questions(vec![
        SeedQuestion {
            text: "Seed one?".into(),
            correct_answer: Some("1".into()),
        },
        SeedQuestion {
            text: "Seed two?".into(),
            correct_answer: None,
        },
    ]);
    let script = Arc::new(ScriptedStore::new(store.clone()));
    let state = AppState::with_store(config, script.clone());
    Harness {
        state,
        store,
        script,
    }
}

impl Harness {
    pub async fn create_game(&self) -> GameSummary {
        host_service::create_game(
            &self.state,
            CreateGameRequest {
                master_pin: MASTER_PIN.into(),
                host_pin: Some(HOST_PIN.into()),
                seed_questions: false,
            },
        )
        .await
        .unwrap()
    }

    pub async fn add_question(&self, game_id: Uuid, text: &str) -> QuestionSummary {
        host_service::add_question(
            &self.state,
            game_id,
            AddQuestionRequest {
                text: text.into(),
                correct_answer: None,
            },
        )
        .await
        .unwrap()
    }

    /// Game with `count` questions, returned in play order.
    pub async fn game_with_questions(&self, count: usize) -> (GameSummary, Vec<QuestionSummary>) {
        let game = self.create_game().await;
        let mut questions = Vec::with_capacity(count);
        for index in 0..count {
            questions.push(self.add_question(game.id, &format!("Question {index}?")).await);
        }
        (game, questions)
    }

    pub async fn join(&self, code: &str, name: &str) -> Uuid {
        player_service::join(
            &self.state,
            JoinRequest {
                code: code.into(),
                name: name.into(),
            },
        )
        .await
        .unwrap()
        .player
        .id
    }

    pub async fn answer(&self, player_id: Uuid, question_id: Uuid, text: &str) -> Uuid {
        player_service::submit_answer(
            &self.state,
            player_id,
            SubmitAnswerRequest {
                question_id,
                answer_text: text.into(),
            },
        )
        .await
        .unwrap()
        .id
    }

    pub async fn player(&self, player_id: Uuid) -> PlayerEntity {
        self.state
            .repository()
            .await
            .unwrap()
            .find_player(player_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn score(&self, player_id: Uuid) -> u32 {
        self.player(player_id).await.score
    }
}
