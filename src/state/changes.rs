use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

/// Table touched by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Games,
    Questions,
    Players,
    Answers,
}

/// Kind of row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Notification emitted after a successful write, scoped to one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RowChange {
    pub table: Table,
    pub kind: ChangeKind,
    pub game_id: Uuid,
    /// Set for answer changes so subscribers can filter on one question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<Uuid>,
}

impl RowChange {
    pub fn new(table: Table, kind: ChangeKind, game_id: Uuid) -> Self {
        Self {
            table,
            kind,
            game_id,
            question_id: None,
        }
    }

    pub fn for_question(mut self, question_id: Uuid) -> Self {
        self.question_id = Some(question_id);
        self
    }
}

/// Per-game broadcast channels carrying [`RowChange`] notifications.
///
/// Delivery is best effort: a subscriber that lags behind the channel
/// capacity loses events and must rely on polling.
pub struct ChangeFeed {
    capacity: usize,
    channels: DashMap<Uuid, broadcast::Sender<RowChange>>,
}

impl ChangeFeed {
    /// Create a feed whose per-game channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Subscribe to the changes of one game.
    pub fn subscribe(&self, game_id: Uuid) -> broadcast::Receiver<RowChange> {
        self.channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send a change to the subscribers of its game.
    ///
    /// A channel left without receivers is dropped here, so games nobody
    /// watches any more do not keep a sender alive.
    pub fn publish(&self, change: RowChange) {
        let game_id = change.game_id;
        let delivered = match self.channels.get(&game_id) {
            Some(sender) => sender.send(change).is_ok(),
            None => return,
        };
        if !delivered {
            self.channels
                .remove_if(&game_id, |_, sender| sender.receiver_count() == 0);
        }
    }

    /// Number of games with an open channel.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Drop the channel of a deleted game, closing its subscriptions.
    pub fn close(&self, game_id: Uuid) {
        self.channels.remove(&game_id);
    }
}
