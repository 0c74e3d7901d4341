use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/games/{id}/events",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses((status = 200, description = "Game SSE stream of `row_change`, `snapshot` and `game_deleted` events", content_type = "text/event-stream", body = String))
)]
/// Stream row changes and authoritative snapshots of one game.
pub async fn game_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let watcher = sse_service::subscribe_game(&state, id).await?;
    Ok(sse_service::to_sse_stream(watcher, id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/games/{id}/events", get(game_stream))
}
