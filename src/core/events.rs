use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::workflow::WorkflowStatus;

/// Event buffered per channel before slow subscribers start lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Progress and lifecycle notifications pushed to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    ConnectionEstablished {
        episode_id: Option<String>,
        message: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowProgress {
        episode_id: String,
        step: String,
        progress: f64,
        timestamp: DateTime<Utc>,
    },
    WorkflowStatus {
        episode_id: String,
        status: WorkflowStatus,
        timestamp: DateTime<Utc>,
    },
    WorkflowLog {
        episode_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowError {
        episode_id: String,
        step: Option<String>,
        error: String,
        timestamp: DateTime<Utc>,
    },
    WorkflowCompleted {
        episode_id: String,
        draft_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    TranscriptionProgress {
        episode_id: String,
        progress: f64,
        message: String,
        timestamp: DateTime<Utc>,
    },
    ContentGenerationProgress {
        episode_id: String,
        progress: f64,
        section: Option<String>,
        timestamp: DateTime<Utc>,
    },
    DraftReady {
        episode_id: String,
        draft_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// Episode the event concerns, if any
    pub fn episode_id(&self) -> Option<&str> {
        match self {
            WorkflowEvent::ConnectionEstablished { episode_id, .. } => episode_id.as_deref(),
            WorkflowEvent::WorkflowProgress { episode_id, .. }
            | WorkflowEvent::WorkflowStatus { episode_id, .. }
            | WorkflowEvent::WorkflowLog { episode_id, .. }
            | WorkflowEvent::WorkflowError { episode_id, .. }
            | WorkflowEvent::WorkflowCompleted { episode_id, .. }
            | WorkflowEvent::TranscriptionProgress { episode_id, .. }
            | WorkflowEvent::ContentGenerationProgress { episode_id, .. }
            | WorkflowEvent::DraftReady { episode_id, .. } => Some(episode_id),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Kind of stream a client subscribes to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Episode,
    User,
}

/// Fan-out of workflow events to per-episode and per-user subscribers
#[derive(Debug)]
pub struct EventHub {
    episodes: DashMap<String, broadcast::Sender<WorkflowEvent>>,
    users: DashMap<String, broadcast::Sender<WorkflowEvent>>,
    capacity: usize,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            episodes: DashMap::new(),
            users: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self, kind: ChannelKind) -> &DashMap<String, broadcast::Sender<WorkflowEvent>> {
        match kind {
            ChannelKind::Episode => &self.episodes,
            ChannelKind::User => &self.users,
        }
    }

    /// Open a subscription, creating the channel on first use
    pub fn subscribe(self: &Arc<Self>, kind: ChannelKind, id: &str) -> Subscription {
        let receiver = self
            .channels(kind)
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        debug!("New {:?} subscription for {}", kind, id);
        Subscription {
            hub: Arc::clone(self),
            kind,
            id: id.to_string(),
            receiver: Some(receiver),
        }
    }

    /// Deliver an event to its episode channel and to the owning user's channel
    pub fn publish(&self, user_id: Option<&str>, event: WorkflowEvent) -> usize {
        let mut delivered = 0;
        if let Some(episode_id) = event.episode_id() {
            delivered += self.send(ChannelKind::Episode, episode_id, &event);
        }
        if let Some(user_id) = user_id {
            delivered += self.send(ChannelKind::User, user_id, &event);
        }
        delivered
    }

    fn send(&self, kind: ChannelKind, id: &str, event: &WorkflowEvent) -> usize {
        match self.channels(kind).get(id) {
            Some(sender) => sender.send(event.clone()).unwrap_or(0),
            None => 0,
        }
    }

    pub fn connection_count(&self, kind: ChannelKind, id: &str) -> usize {
        self.channels(kind)
            .get(id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        let count = |map: &DashMap<String, broadcast::Sender<WorkflowEvent>>| -> usize {
            map.iter().map(|entry| entry.value().receiver_count()).sum()
        };
        count(&self.episodes) + count(&self.users)
    }

    pub fn channel_count(&self) -> usize {
        self.episodes.len() + self.users.len()
    }

    /// Drop a channel once nobody listens to it
    fn prune(&self, kind: ChannelKind, id: &str) {
        let removed = self
            .channels(kind)
            .remove_if(id, |_, sender| sender.receiver_count() == 0);
        if removed.is_some() {
            debug!("Closed idle {:?} channel {}", kind, id);
        }
    }
}

/// Receiving end of an event stream; the channel is pruned on drop
pub struct Subscription {
    hub: Arc<EventHub>,
    kind: ChannelKind,
    id: String,
    receiver: Option<broadcast::Receiver<WorkflowEvent>>,
}

impl Subscription {
    /// Next event, skipping over events missed while lagging.
    /// Returns `None` when the channel is closed.
    pub async fn recv(&mut self) -> Option<WorkflowEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscriber on {} lagged, skipped {} events", self.id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.take();
        self.hub.prune(self.kind, &self.id);
    }
}
