//! Client-side cache of a game's authoritative position.
//!
//! A view issues a command by planning it here first: the mirror predicts the
//! resulting position with the same [`transition`] function the controller
//! runs, exposes that prediction while the command is in flight, and replaces
//! it with the fetched authoritative state once the command settles.

use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::GameStatus;
use crate::state::state_machine::{LifecycleEvent, Position, TransitionError, transition};

/// Unique identifier for an in-flight command.
pub type PlanId = Uuid;

/// Minimal authoritative facts a view needs to predict transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirroredGame {
    pub position: Position,
    pub question_count: usize,
}

/// A planned command whose outcome has been predicted but not confirmed.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    pub id: PlanId,
    pub event: LifecycleEvent,
    pub from: MirroredGame,
    pub predicted: MirroredGame,
    pub pending_since: Instant,
}

/// Outcome of settling a command against fetched state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub predicted: MirroredGame,
    pub actual: MirroredGame,
}

impl Settled {
    /// Whether the local prediction matched the authoritative outcome.
    pub fn converged(&self) -> bool {
        self.predicted == self.actual
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("a command is already pending")]
    AlreadyPending,
    #[error("no authoritative state loaded yet")]
    NotLoaded,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettleError {
    #[error("no command is pending")]
    NoPending,
    #[error("pending command {expected} does not match {got}")]
    IdMismatch { expected: PlanId, got: PlanId },
}

/// Cache of the last known authoritative state plus at most one pending command.
#[derive(Debug, Clone, Default)]
pub struct GameMirror {
    cached: Option<MirroredGame>,
    pending: Option<PendingCommand>,
}

impl GameMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// State to render: the prediction while a command is pending, the cache otherwise.
    pub fn view(&self) -> Option<MirroredGame> {
        self.pending
            .as_ref()
            .map(|pending| pending.predicted)
            .or(self.cached)
    }

    /// Whether a command is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Store state pushed or polled from the server.
    ///
    /// Ignored while a command is pending so the prediction is not flickered
    /// away by a stale read; the settle step installs the fresh state.
    pub fn refresh(&mut self, fetched: MirroredGame) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.cached = Some(fetched);
        true
    }

    /// Predict the effect of `event` and mark it pending.
    pub fn plan(&mut self, event: LifecycleEvent) -> Result<PendingCommand, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }
        let from = self.cached.ok_or(PlanError::NotLoaded)?;
        let position = transition(from.position, event, from.question_count)?;
        let question_count = match event {
            LifecycleEvent::Reset => 0,
            _ => from.question_count,
        };

        let pending = PendingCommand {
            id: Uuid::new_v4(),
            event,
            from,
            predicted: MirroredGame {
                position,
                question_count,
            },
            pending_since: Instant::now(),
        };
        self.pending = Some(pending.clone());
        Ok(pending)
    }

    /// Replace the prediction with the state fetched after the command succeeded.
    pub fn settle(&mut self, plan_id: PlanId, fetched: MirroredGame) -> Result<Settled, SettleError> {
        let pending = self.pending.take().ok_or(SettleError::NoPending)?;
        if pending.id != plan_id {
            let expected = pending.id;
            self.pending = Some(pending);
            return Err(SettleError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        self.cached = Some(fetched);
        Ok(Settled {
            predicted: pending.predicted,
            actual: fetched,
        })
    }

    /// Drop a pending command after the server rejected it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), SettleError> {
        let pending = self.pending.as_ref().ok_or(SettleError::NoPending)?;
        if pending.id != plan_id {
            return Err(SettleError::IdMismatch {
                expected: pending.id,
                got: plan_id,
            });
        }
        self.pending = None;
        Ok(())
    }

    /// Id of the pending command if it has been in flight for at least `max_age`.
    ///
    /// A view aborts such a command and waits for the next refresh when the
    /// response to it was lost.
    pub fn stale_pending(&self, max_age: Duration) -> Option<PlanId> {
        self.pending
            .as_ref()
            .filter(|pending| pending.pending_since.elapsed() >= max_age)
            .map(|pending| pending.id)
    }

    /// Status currently rendered, if any.
    pub fn status(&self) -> Option<GameStatus> {
        self.view().map(|game| game.position.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby(question_count: usize) -> MirroredGame {
        MirroredGame {
            position: Position::LOBBY,
            question_count,
        }
    }

    #[test]
    fn plan_requires_loaded_state() {
        let mut mirror = GameMirror::new();
        assert_eq!(
            mirror.plan(LifecycleEvent::Start).unwrap_err(),
            PlanError::NotLoaded
        );
    }

    #[test]
    fn stale_pending_reports_commands_in_flight_too_long() {
        let mut mirror = GameMirror::new();
        mirror.refresh(lobby(1));
        assert_eq!(mirror.stale_pending(Duration::ZERO), None);

        let plan = mirror.plan(LifecycleEvent::Start).unwrap();
        assert_eq!(mirror.stale_pending(Duration::from_secs(3600)), None);
        assert_eq!(mirror.stale_pending(Duration::ZERO), Some(plan.id));

        mirror.abort(plan.id).unwrap();
        assert_eq!(mirror.status(), Some(GameStatus::Lobby));
    }

    #[test]
    fn prediction_is_visible_until_settled() {
        let mut mirror = GameMirror::new();
        mirror.refresh(lobby(2));

        let plan = mirror.plan(LifecycleEvent::Start).unwrap();
        assert_eq!(mirror.status(), Some(GameStatus::Active));
        assert!(!mirror.refresh(lobby(2)), "refresh ignored while pending");

        let settled = mirror.settle(plan.id, plan.predicted).unwrap();
        assert!(settled.converged());
        assert!(!mirror.is_pending());
    }

    #[test]
    fn only_one_command_in_flight() {
        let mut mirror = GameMirror::new();
        mirror.refresh(lobby(1));
        mirror.plan(LifecycleEvent::Start).unwrap();
        assert_eq!(
            mirror.plan(LifecycleEvent::Start).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn abort_restores_cached_view() {
        let mut mirror = GameMirror::new();
        mirror.refresh(lobby(1));
        let plan = mirror.plan(LifecycleEvent::Start).unwrap();

        mirror.abort(plan.id).unwrap();

        assert_eq!(mirror.view(), Some(lobby(1)));
    }

    #[test]
    fn rejected_transition_is_not_pending() {
        let mut mirror = GameMirror::new();
        mirror.refresh(lobby(0));
        assert_eq!(
            mirror.plan(LifecycleEvent::Start).unwrap_err(),
            PlanError::Transition(TransitionError::NoQuestions)
        );
        assert!(!mirror.is_pending());
    }

    #[test]
    fn settle_with_wrong_id_keeps_pending() {
        let mut mirror = GameMirror::new();
        mirror.refresh(lobby(1));
        mirror.plan(LifecycleEvent::Start).unwrap();

        let err = mirror.settle(Uuid::new_v4(), lobby(1)).unwrap_err();
        assert!(matches!(err, SettleError::IdMismatch { .. }));
        assert!(mirror.is_pending());
    }
}
