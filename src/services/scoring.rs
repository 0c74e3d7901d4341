//! Score reconciliation for graded questions.
//!
//! Each qualifying player costs one read and one write. The pair is not
//! atomic: two passes racing on the same player can lose an update. A single
//! host drives grading, so this is accepted rather than locked.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{dao::repository::TriviaRepository, error::ServiceError};

/// Add one point to the author of every correct answer to `question_id`.
///
/// Returns the number of players whose score was written.
pub async fn award(repository: &TriviaRepository, question_id: Uuid) -> Result<usize, ServiceError> {
    apply(repository, question_id, |score| score.saturating_add(1)).await
}

/// Take back the point granted for every correct answer to `question_id`, never below zero.
pub async fn revert(
    repository: &TriviaRepository,
    question_id: Uuid,
) -> Result<usize, ServiceError> {
    apply(repository, question_id, |score| score.saturating_sub(1)).await
}

async fn apply(
    repository: &TriviaRepository,
    question_id: Uuid,
    adjust: impl Fn(u32) -> u32,
) -> Result<usize, ServiceError> {
    let correct = repository.list_correct_answers(question_id).await?;
    let mut written = 0;

    for answer in correct {
        let Some(player) = repository.find_player(answer.player_id).await? else {
            warn!(
                %question_id,
                player_id = %answer.player_id,
                "correct answer belongs to a missing player; skipping"
            );
            continue;
        };

        let score = adjust(player.score);
        debug!(player_id = %player.id, from = player.score, to = score, "reconciling score");
        if repository.set_player_score(&player, score).await? {
            written += 1;
        }
    }

    Ok(written)
}
