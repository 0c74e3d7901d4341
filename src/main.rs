//! Trivia Night Back binary entrypoint wiring REST, SSE and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_night_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryStore,
    routes,
    state::{AppState, SharedState},
};

#[cfg(feature = "mongo-store")]
const DEFAULT_BACKEND: &str = "mongo";
#[cfg(not(feature = "mongo-store"))]
const DEFAULT_BACKEND: &str = "memory";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| DEFAULT_BACKEND.into());
    install_storage(&app_state, &backend).await?;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, %backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the in-memory store directly or start the supervisor for a database backend.
async fn install_storage(state: &SharedState, backend: &str) -> anyhow::Result<()> {
    match backend {
        "memory" => {
            warn!("using the in-memory store; data is lost on restart");
            state.set_game_store(Arc::new(MemoryStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            tokio::spawn(spawn_mongo_supervisor(state.clone()));
        }
        other => bail!("unsupported STORAGE_BACKEND `{other}`"),
    }
    Ok(())
}

#[cfg(feature = "mongo-store")]
async fn spawn_mongo_supervisor(state: SharedState) {
    use trivia_night_back::{
        dao::{
            game_store::{
                GameStore,
                mongodb::{MongoConfig, MongoGameStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    storage_supervisor::run(state, "mongodb", || async {
        let config = MongoConfig::from_env()?;
        let store = MongoGameStore::connect(config).await?;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
    })
    .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
