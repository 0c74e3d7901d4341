use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status stored on every game row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Players may join and the host edits the question set.
    Lobby,
    /// The current question is open for answers.
    Active,
    /// Answers are frozen and the host grades them.
    Grading,
    /// Scores for the current question are shown.
    Revealing,
    /// Every question has been played.
    Finished,
}

/// Game row persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Upper-case join code shared with players.
    pub code: String,
    /// Per-game secret gating the host view.
    pub host_pin: String,
    /// Current lifecycle status.
    pub status: GameStatus,
    /// Zero-based index into the ordered question list.
    pub current_question: usize,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Question row, owned by exactly one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Prompt shown to the players.
    pub text: String,
    /// Reference answer for the host; grading stays manual.
    pub correct_answer: Option<String>,
    /// Position of the question inside the game.
    pub order_num: i32,
    /// Insertion timestamp, used to break `order_num` ties.
    pub created_at: SystemTime,
}

/// Player row, owned by exactly one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key of the player.
    pub id: Uuid,
    /// Game the player joined.
    pub game_id: Uuid,
    /// Display name (not unique).
    pub name: String,
    /// Number of correctly graded answers.
    pub score: u32,
    /// Join timestamp.
    pub joined_at: SystemTime,
}

/// Answer row; at most one per (player, question).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Primary key of the answer.
    pub id: Uuid,
    /// Author of the answer.
    pub player_id: Uuid,
    /// Question being answered.
    pub question_id: Uuid,
    /// Free-text response.
    pub answer_text: String,
    /// Host grade, `None` while ungraded.
    pub is_correct: Option<bool>,
    /// Last submission or edit timestamp.
    pub submitted_at: SystemTime,
}

/// Answer joined with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerWithPlayerEntity {
    /// The answer row.
    pub answer: AnswerEntity,
    /// The player who wrote it.
    pub player: PlayerEntity,
}
