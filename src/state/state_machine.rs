use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::models::GameStatus;

/// Where a game stands: its status and the question it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Position {
    /// Lifecycle status.
    pub status: GameStatus,
    /// Zero-based index of the current question.
    pub current_question: usize,
}

impl Position {
    /// Position of a freshly created or reset game.
    pub const LOBBY: Position = Position {
        status: GameStatus::Lobby,
        current_question: 0,
    };

    /// Build a position from raw parts.
    pub fn new(status: GameStatus, current_question: usize) -> Self {
        Self {
            status,
            current_question,
        }
    }
}

/// Host commands that move a game through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Open the first question.
    Start,
    /// Stop collecting answers for the current question.
    CloseAnswers,
    /// Grading is complete; show the scores.
    FinishGrading,
    /// Advance to the next question, or finish after the last one.
    Next,
    /// Reopen the current question from scratch.
    Redo,
    /// Return a lobby or finished game to an empty lobby.
    Reset,
}

/// Error returned when an event cannot be applied to a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not allowed from the current status.
    #[error("invalid transition: {event:?} cannot be applied while {from:?}")]
    InvalidTransition {
        /// Status the game was in.
        from: GameStatus,
        /// Rejected event.
        event: LifecycleEvent,
    },
    /// `Start` was requested on a game without questions.
    #[error("cannot start a game without questions")]
    NoQuestions,
}

/// Compute the position reached by applying `event` to `from`.
///
/// `question_count` is the number of questions the game currently owns. The
/// function is pure so the controller and client-side mirrors share it.
pub fn transition(
    from: Position,
    event: LifecycleEvent,
    question_count: usize,
) -> Result<Position, TransitionError> {
    use GameStatus::*;
    use LifecycleEvent::*;

    let next = match (from.status, event) {
        (Lobby, Start) => {
            if question_count == 0 {
                return Err(TransitionError::NoQuestions);
            }
            Position::new(Active, 0)
        }
        (Active, CloseAnswers) => Position::new(Grading, from.current_question),
        (Grading, FinishGrading) => Position::new(Revealing, from.current_question),
        (Revealing, Next) => {
            let next_index = from.current_question + 1;
            if next_index < question_count {
                Position::new(Active, next_index)
            } else {
                Position::new(Finished, from.current_question)
            }
        }
        (Active | Grading | Revealing, Redo) => Position::new(Active, from.current_question),
        (Lobby | Finished, Reset) => Position::LOBBY,
        (status, event) => {
            return Err(TransitionError::InvalidTransition {
                from: status,
                event,
            });
        }
    };

    Ok(next)
}
