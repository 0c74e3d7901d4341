//! Short public codes players type to find a game.

use rand::Rng;
use tracing::{debug, warn};

use crate::{dao::repository::TriviaRepository, error::ServiceError};

/// Number of characters in a join code.
pub const JOIN_CODE_LENGTH: usize = 4;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produce a random upper-case alphanumeric code.
pub fn generate(rng: &mut impl Rng) -> String {
    (0..JOIN_CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for storage and lookup: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Pick a code that no stored game uses, trying at most `attempts` candidates.
pub async fn allocate(repository: &TriviaRepository, attempts: u32) -> Result<String, ServiceError> {
    for attempt in 0..attempts {
        let candidate = generate(&mut rand::rng());
        if repository.find_game_by_code(&candidate).await?.is_none() {
            return Ok(candidate);
        }
        debug!(attempt, code = %candidate, "join code already taken");
    }

    warn!(attempts, "could not find a free join code");
    Err(ServiceError::InvalidState(
        "could not allocate a unique join code, try again".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn generated_codes_are_upper_case_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate(&mut rng);
            assert_eq!(code.len(), JOIN_CODE_LENGTH);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            );
        }
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        assert_eq!(normalize_code("  ab1z\t"), "AB1Z");
    }
}
