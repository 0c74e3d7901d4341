//! Master and host secret checks.
//!
//! Every failure produces the same message so a caller cannot tell which
//! secret, if any, was close.

use crate::{config::AppConfig, dao::models::GameEntity, error::ServiceError};

const INVALID_PIN: &str = "invalid PIN";

fn invalid_pin() -> ServiceError {
    ServiceError::Unauthorized(INVALID_PIN.into())
}

/// Compare two secrets without short-circuiting on the first differing byte.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Accept `provided` only if it matches the configured master secret.
pub fn require_master_pin(config: &AppConfig, provided: &str) -> Result<(), ServiceError> {
    match config.master_pin() {
        Some(expected) if secrets_match(expected, provided.trim()) => Ok(()),
        _ => Err(invalid_pin()),
    }
}

/// Accept `provided` only if it matches the host secret stored on `game`.
pub fn require_host_pin(game: &GameEntity, provided: Option<&str>) -> Result<(), ServiceError> {
    require_host_pin_for(Some(game), provided)
}

/// Like [`require_host_pin`], failing the same way when the game is missing.
pub fn require_host_pin_for(
    game: Option<&GameEntity>,
    provided: Option<&str>,
) -> Result<(), ServiceError> {
    match (game, provided) {
        (Some(game), Some(pin)) if secrets_match(&game.host_pin, pin.trim()) => Ok(()),
        _ => Err(invalid_pin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::GameStatus;
    use std::time::SystemTime;
    use uuid::Uuid;

    fn game(host_pin: &str) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            code: "ABCD".into(),
            host_pin: host_pin.into(),
            status: GameStatus::Lobby,
            current_question: 0,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn master_pin_must_be_configured_and_match() {
        assert!(require_master_pin(&AppConfig::default(), "").is_err());
        let config = AppConfig::new("4242");
        assert!(require_master_pin(&config, "4242").is_ok());
        assert!(require_master_pin(&config, " 4242 ").is_ok());
        assert!(require_master_pin(&config, "4243").is_err());
    }

    #[test]
    fn host_pin_failures_share_one_message() {
        let game = game("1111");
        assert!(require_host_pin(&game, Some("1111")).is_ok());

        let missing = require_host_pin(&game, None).unwrap_err().to_string();
        let wrong = require_host_pin(&game, Some("2222")).unwrap_err().to_string();
        let master = require_master_pin(&AppConfig::new("9"), "8")
            .unwrap_err()
            .to_string();
        assert_eq!(missing, wrong);
        assert_eq!(wrong, master);
    }

    #[test]
    fn unknown_game_fails_like_a_wrong_pin() {
        let wrong = require_host_pin(&game("1111"), Some("2222"))
            .unwrap_err()
            .to_string();
        let unknown = require_host_pin_for(None, Some("1111"))
            .unwrap_err()
            .to_string();
        assert_eq!(unknown, wrong);
    }
}
