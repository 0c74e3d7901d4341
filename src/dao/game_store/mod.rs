pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use std::time::SystemTime;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, AnswerWithPlayerEntity, GameEntity, GameStatus, PlayerEntity, QuestionEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence service holding the four record kinds.
///
/// Every method is a single round trip; the trait offers no multi-row
/// transactions, so callers issuing several writes must tolerate partial
/// application when a later step fails.
pub trait GameStore: Send + Sync {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Lookup by join code; `code` must already be upper-case.
    fn find_game_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn update_game_position(
        &self,
        id: Uuid,
        status: GameStatus,
        current_question: usize,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Questions of a game ordered by `order_num`, then insertion time.
    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete_questions_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Players of a game ordered by score descending, then join time.
    fn list_players(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn update_player_score(&self, id: Uuid, score: u32) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete_players_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>>;
    fn find_player_answer(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>>;
    fn update_answer_text(
        &self,
        id: Uuid,
        answer_text: String,
        submitted_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn update_answer_grade(
        &self,
        id: Uuid,
        is_correct: bool,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Answers of a question joined with their authors, oldest submission first.
    fn list_answers_with_players(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerWithPlayerEntity>>>;
    /// Answers of a question whose grade is exactly `true`.
    fn list_correct_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
    fn delete_answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    fn delete_answers_for_players(
        &self,
        player_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
