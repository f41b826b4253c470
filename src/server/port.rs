use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic carrying session lifecycle events.
pub const SESSION_TOPIC: &str = "auth.session";

/// Explicit fan-out seam. Session changes are published here by the API
/// layer, never from inside the rotation protocol; subsystems that care
/// (realtime, audit) subscribe on their side of this interface.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SessionStarted,
    SessionRotated,
    SessionEnded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub event: SessionEventKind,
    pub subject: String,
    pub at: DateTime<Utc>,
}
