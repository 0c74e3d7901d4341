//! Per-viewer game watcher merging pushed row changes with a polling fallback.
//!
//! Push delivery is best effort, so the watcher also re-reads the snapshot on
//! a fixed interval. A change whose notification was lost is therefore seen
//! within one poll interval.

use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::game::GameSnapshot,
    services::public_service::load_snapshot,
    state::{SharedState, changes::RowChange},
};

/// Event delivered to a watcher's consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A write to the game was pushed.
    Change(RowChange),
    /// The authoritative snapshot differs from the last one delivered.
    Snapshot(GameSnapshot),
    /// The game no longer exists; nothing follows.
    Deleted,
}

/// Start watching `game_id`. The task stops when the receiver is dropped or the game is deleted.
pub fn spawn_watcher(state: SharedState, game_id: Uuid) -> mpsc::Receiver<WatchEvent> {
    let (tx, rx) = mpsc::channel(16);
    let mut changes = state.changes().subscribe(game_id);

    tokio::spawn(async move {
        let mut ticker = interval(state.config().poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<GameSnapshot> = None;
        let mut push_open = true;

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = changes.recv(), if push_open => match received {
                    Ok(change) => {
                        if tx.send(WatchEvent::Change(change)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(%game_id, skipped, "watcher lagged behind change feed");
                    }
                    Err(RecvError::Closed) => push_open = false,
                },
                _ = ticker.tick() => {}
            }

            if !refresh(&state, game_id, &mut last, &tx).await {
                break;
            }
        }

        debug!(%game_id, "game watcher stopped");
    });

    rx
}

/// Re-read the snapshot and forward it if it changed. Returns `false` to stop watching.
async fn refresh(
    state: &SharedState,
    game_id: Uuid,
    last: &mut Option<GameSnapshot>,
    tx: &mpsc::Sender<WatchEvent>,
) -> bool {
    let repository = match state.repository().await {
        Ok(repository) => repository,
        Err(err) => {
            warn!(%game_id, error = %err, "watcher cannot read game; retrying on next tick");
            return true;
        }
    };

    match load_snapshot(&repository, game_id).await {
        Ok(Some(snapshot)) => {
            if last.as_ref() == Some(&snapshot) {
                return true;
            }
            *last = Some(snapshot.clone());
            tx.send(WatchEvent::Snapshot(snapshot)).await.is_ok()
        }
        Ok(None) => {
            let _ = tx.send(WatchEvent::Deleted).await;
            false
        }
        Err(err) => {
            warn!(%game_id, error = %err, "watcher snapshot failed; retrying on next tick");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryStore},
            models::{GameEntity, GameStatus, QuestionEntity},
        },
        state::AppState,
    };

    async fn seeded_state() -> (SharedState, MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let state = AppState::with_store(
            AppConfig::new("0000").with_poll_interval(Duration::from_secs(3)),
            Arc::new(store.clone()),
        );
        let game_id = Uuid::new_v4();
        store
            .insert_game(GameEntity {
                id: game_id,
                code: "WXYZ".into(),
                host_pin: "0000".into(),
                status: GameStatus::Lobby,
                current_question: 0,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        store
            .insert_question(QuestionEntity {
                id: Uuid::new_v4(),
                game_id,
                text: "2 + 2?".into(),
                correct_answer: Some("4".into()),
                order_num: 0,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        (state, store, game_id)
    }

    fn status_of(event: WatchEvent) -> GameStatus {
        match event {
            WatchEvent::Snapshot(snapshot) => snapshot.game.status,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_corrects_a_missed_push() {
        let (state, store, game_id) = seeded_state().await;
        let mut rx = spawn_watcher(state, game_id);
        assert_eq!(status_of(rx.recv().await.unwrap()), GameStatus::Lobby);

        // Written behind the repository's back: no push is published.
        store
            .update_game_position(game_id, GameStatus::Active, 0)
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        assert_eq!(status_of(rx.recv().await.unwrap()), GameStatus::Active);
        assert!(started.elapsed() <= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn pushed_changes_refresh_immediately() {
        let (state, _store, game_id) = seeded_state().await;
        let mut rx = spawn_watcher(state.clone(), game_id);
        assert_eq!(status_of(rx.recv().await.unwrap()), GameStatus::Lobby);

        let repository = state.repository().await.unwrap();
        repository
            .set_game_position(game_id, GameStatus::Active, 0)
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        assert!(matches!(rx.recv().await.unwrap(), WatchEvent::Change(_)));
        assert_eq!(status_of(rx.recv().await.unwrap()), GameStatus::Active);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_game_ends_the_watch() {
        let (state, store, game_id) = seeded_state().await;
        let mut rx = spawn_watcher(state, game_id);
        rx.recv().await.unwrap();

        store.delete_game(game_id).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), WatchEvent::Deleted);
        assert!(rx.recv().await.is_none());
    }
}
