use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::sse::{GameDeletedEvent, ServerEvent},
    error::ServiceError,
    services::{
        lifecycle_service::find_game,
        watch_service::{WatchEvent, spawn_watcher},
    },
    state::SharedState,
};

pub const ROW_CHANGE_EVENT: &str = "row_change";
pub const SNAPSHOT_EVENT: &str = "snapshot";
pub const GAME_DELETED_EVENT: &str = "game_deleted";

/// Start watching `game_id` for a new stream, failing if the game does not exist.
pub async fn subscribe_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<mpsc::Receiver<WatchEvent>, ServiceError> {
    let repository = state.repository().await?;
    find_game(&repository, game_id).await?;

    info!(%game_id, "game SSE stream connected");
    Ok(spawn_watcher(state.clone(), game_id))
}

/// Encode a watcher event for the wire.
fn encode(event: &WatchEvent, game_id: Uuid) -> serde_json::Result<ServerEvent> {
    match event {
        WatchEvent::Change(change) => ServerEvent::json(ROW_CHANGE_EVENT, change),
        WatchEvent::Snapshot(snapshot) => ServerEvent::json(SNAPSHOT_EVENT, snapshot),
        WatchEvent::Deleted => ServerEvent::json(GAME_DELETED_EVENT, &GameDeletedEvent { game_id }),
    }
}

/// Convert a watcher into an SSE response, forwarding events until either side closes.
pub fn to_sse_stream(
    mut watcher: mpsc::Receiver<WatchEvent>,
    game_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = watcher.recv() => {
                    let Some(event) = next else { break };
                    let payload = match encode(&event, game_id) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%game_id, error = %err, "failed to encode SSE event");
                            continue;
                        }
                    };

                    let sse = Event::default().event(payload.event).data(payload.data);
                    if tx.send(Ok(sse)).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(%game_id, "game SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
