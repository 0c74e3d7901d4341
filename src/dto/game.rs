use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, AnswerWithPlayerEntity, GameEntity, GameStatus, PlayerEntity, QuestionEntity,
};
use crate::dto::format_system_time;

/// Public description of a game. The host secret is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    /// Upper-case join code.
    pub code: String,
    pub status: GameStatus,
    pub current_question: usize,
    pub created_at: String,
}

impl From<&GameEntity> for GameSummary {
    fn from(game: &GameEntity) -> Self {
        Self {
            id: game.id,
            code: game.code.clone(),
            status: game.status,
            current_question: game.current_question,
            created_at: format_system_time(game.created_at),
        }
    }
}

/// Question as seen by the host, including the reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub text: String,
    pub correct_answer: Option<String>,
    pub order_num: i32,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            text: question.text,
            correct_answer: question.correct_answer,
            order_num: question.order_num,
        }
    }
}

/// Question as seen by players; the reference answer is only filled once revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub text: String,
    /// Zero-based position of the question in the game.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl PublicQuestion {
    /// Build the player-facing view of `question`, hiding the answer unless `status` reveals it.
    pub fn for_status(question: &QuestionEntity, index: usize, status: GameStatus) -> Self {
        let revealed = matches!(status, GameStatus::Revealing | GameStatus::Finished);
        Self {
            id: question.id,
            text: question.text.clone(),
            index,
            correct_answer: revealed
                .then(|| question.correct_answer.clone())
                .flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub joined_at: String,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            score: player.score,
            joined_at: format_system_time(player.joined_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnswerSummary {
    pub id: Uuid,
    pub player_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: String,
    /// `null` until the host grades the answer.
    pub is_correct: Option<bool>,
    pub submitted_at: String,
}

impl From<AnswerEntity> for AnswerSummary {
    fn from(answer: AnswerEntity) -> Self {
        Self {
            id: answer.id,
            player_id: answer.player_id,
            question_id: answer.question_id,
            answer_text: answer.answer_text,
            is_correct: answer.is_correct,
            submitted_at: format_system_time(answer.submitted_at),
        }
    }
}

/// Answer listed for grading together with its author's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthoredAnswer {
    #[serde(flatten)]
    pub answer: AnswerSummary,
    pub player_name: String,
}

impl From<AnswerWithPlayerEntity> for AuthoredAnswer {
    fn from(value: AnswerWithPlayerEntity) -> Self {
        Self {
            answer: value.answer.into(),
            player_name: value.player.name,
        }
    }
}

/// Authoritative state of a game shared with every viewer.
///
/// Two snapshots compare equal when nothing a viewer renders has changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameSnapshot {
    pub game: GameSummary,
    pub question_count: usize,
    /// Question at `current_question` while the game is past the lobby.
    pub question: Option<PublicQuestion>,
    /// Number of answers submitted for that question.
    pub answer_count: usize,
    /// Players ordered by score, best first.
    pub players: Vec<PlayerSummary>,
}
