//! Store wrapper that fails chosen operations, counts calls and can hold
//! player reads at a barrier to force interleavings.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Barrier;
use trivia_night_back::dao::{
    game_store::{
        GameStore,
        memory::{MemoryStore, MemoryStoreError},
    },
    models::{
        AnswerEntity, AnswerWithPlayerEntity, GameEntity, GameStatus, PlayerEntity, QuestionEntity,
    },
    storage::{StorageError, StorageResult},
};
use uuid::Uuid;

/// Store operations a test can fail or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    UpdateGamePosition,
    FindPlayer,
    UpdatePlayerScore,
    DeleteAnswersForQuestion,
}

pub struct ScriptedStore {
    inner: MemoryStore,
    failing: Mutex<HashSet<Op>>,
    calls: DashMap<Op, usize>,
    player_read_gate: Mutex<Option<Arc<Barrier>>>,
}

fn failed<T: Send + 'static>(err: StorageError) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(async move { Err(err) })
}

impl ScriptedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            calls: DashMap::new(),
            player_read_gate: Mutex::new(None),
        }
    }

    /// Make every later call to `op` fail like a lost connection.
    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.get(&op).map(|count| *count).unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Hold every player read, after it has read the row, until `parties`
    /// reads are waiting.
    pub fn gate_player_reads(&self, parties: usize) {
        *self.player_read_gate.lock().unwrap() = Some(Arc::new(Barrier::new(parties)));
    }

    pub fn open_player_reads(&self) {
        self.player_read_gate.lock().unwrap().take();
    }

    fn record(&self, op: Op) -> Result<(), StorageError> {
        *self.calls.entry(op).or_insert(0) += 1;
        if self.failing.lock().unwrap().contains(&op) {
            return Err(MemoryStoreError::Offline.into());
        }
        Ok(())
    }
}

impl GameStore for ScriptedStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_game(game)
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.inner.find_game(id)
    }

    fn find_game_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.inner.find_game_by_code(code)
    }

    fn update_game_position(
        &self,
        id: Uuid,
        status: GameStatus,
        current_question: usize,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        if let Err(err) = self.record(Op::UpdateGamePosition) {
            return failed(err);
        }
        self.inner.update_game_position(id, status, current_question)
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_game(id)
    }

    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_question(question)
    }

    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        self.inner.list_questions(game_id)
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_question(id)
    }

    fn delete_questions_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_questions_for_game(game_id)
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_player(player)
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        if let Err(err) = self.record(Op::FindPlayer) {
            return failed(err);
        }
        let gate = self.player_read_gate.lock().unwrap().clone();
        let read = self.inner.find_player(id);
        Box::pin(async move {
            let player = read.await;
            if let Some(gate) = gate {
                gate.wait().await;
            }
            player
        })
    }

    fn list_players(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.inner.list_players(game_id)
    }

    fn update_player_score(&self, id: Uuid, score: u32) -> BoxFuture<'static, StorageResult<bool>> {
        if let Err(err) = self.record(Op::UpdatePlayerScore) {
            return failed(err);
        }
        self.inner.update_player_score(id, score)
    }

    fn delete_players_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_players_for_game(game_id)
    }

    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_answer(answer)
    }

    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        self.inner.find_answer(id)
    }

    fn find_player_answer(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        self.inner.find_player_answer(player_id, question_id)
    }

    fn update_answer_text(
        &self,
        id: Uuid,
        answer_text: String,
        submitted_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.update_answer_text(id, answer_text, submitted_at)
    }

    fn update_answer_grade(
        &self,
        id: Uuid,
        is_correct: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.update_answer_grade(id, is_correct)
    }

    fn list_answers_with_players(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerWithPlayerEntity>>> {
        self.inner.list_answers_with_players(question_id)
    }

    fn list_correct_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        self.inner.list_correct_answers(question_id)
    }

    fn delete_answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        if let Err(err) = self.record(Op::DeleteAnswersForQuestion) {
            return failed(err);
        }
        self.inner.delete_answers_for_question(question_id)
    }

    fn delete_answers_for_players(
        &self,
        player_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_answers_for_players(player_ids)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}
