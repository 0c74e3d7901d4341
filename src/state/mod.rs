pub mod changes;
pub mod mirror;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{game_store::GameStore, repository::TriviaRepository},
    error::ServiceError,
};

use self::changes::ChangeFeed;

pub type SharedState = Arc<AppState>;

/// Capacity of each per-game change channel.
const CHANGE_FEED_CAPACITY: usize = 64;

/// Central application state: storage handle, change feed and configuration.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    degraded: watch::Sender<bool>,
    changes: Arc<ChangeFeed>,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            degraded: degraded_tx,
            changes: Arc::new(ChangeFeed::new(CHANGE_FEED_CAPACITY)),
            config: Arc::new(config),
        })
    }

    /// State with `store` already installed, as used by tests and the memory backend.
    pub fn with_store(config: AppConfig, store: Arc<dyn GameStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            game_store: RwLock::new(Some(store)),
            degraded: degraded_tx,
            changes: Arc::new(ChangeFeed::new(CHANGE_FEED_CAPACITY)),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Per-game change notifications.
    pub fn changes(&self) -> &Arc<ChangeFeed> {
        &self.changes
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Return the installed store or fail with [`ServiceError::Degraded`].
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Access layer bound to the current store and the change feed.
    ///
    /// Commands are refused while degraded even if a store handle is still
    /// installed, since the supervisor only flags degraded after a failed
    /// health check.
    pub async fn repository(&self) -> Result<TriviaRepository, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        let store = self.require_game_store().await?;
        Ok(TriviaRepository::new(store, self.changes.clone()))
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
