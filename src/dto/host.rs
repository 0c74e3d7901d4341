use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dto::{
    game::{AuthoredAnswer, GameSummary, PlayerSummary, QuestionSummary},
    validation::validate_not_blank,
};

/// Payload used to create a game; gated by the master secret.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    pub master_pin: String,
    /// Host secret for this game. Defaults to the master secret when omitted.
    #[serde(default)]
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub host_pin: Option<String>,
    /// Copy the configured seed questions into the new game.
    #[serde(default)]
    pub seed_questions: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddQuestionRequest {
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub text: String,
    /// Reference answer shown to the host while grading.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeAnswerRequest {
    pub is_correct: bool,
}

/// Query string of the nuke route; the game is only deleted with `confirm=true`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NukeQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Everything the host screen renders.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostGameView {
    pub game: GameSummary,
    pub questions: Vec<QuestionSummary>,
    pub players: Vec<PlayerSummary>,
    /// Answers to the current question while it is open or being graded.
    pub answers: Vec<AuthoredAnswer>,
}
