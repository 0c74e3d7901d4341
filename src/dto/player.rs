use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{
    game::{AnswerSummary, GameSummary, PlayerSummary, PublicQuestion},
    validation::{validate_join_code, validate_not_blank},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    /// Join code in any case.
    #[validate(custom(function = "validate_join_code"))]
    pub code: String,
    #[validate(length(min = 1, max = 40), custom(function = "validate_not_blank"))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub player: PlayerSummary,
    pub game: GameSummary,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub answer_text: String,
}

/// Everything a player's screen renders.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerGameView {
    pub player: PlayerSummary,
    pub game: GameSummary,
    pub question: Option<PublicQuestion>,
    /// The player's own answer to `question`, if any.
    pub answer: Option<AnswerSummary>,
    pub leaderboard: Vec<PlayerSummary>,
}
