use crate::application_port::AuthError;
use crate::domain_model::SubjectId;
use crate::domain_port::SessionRegistry;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use super::PurgeExpired;

struct Entry {
    token_id: String,
    expires_at: DateTime<Utc>,
}

/// Dashmap-backed registry. Insert overwrites unconditionally, matching the
/// last-write-wins contract of the Redis adapter.
#[derive(Default)]
pub struct MemorySessionRegistry {
    entries: DashMap<SubjectId, Entry>,
}

impl MemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn set_current(
        &self,
        subject: SubjectId,
        token_id: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        self.entries.insert(
            subject,
            Entry {
                token_id: token_id.to_string(),
                expires_at: Utc::now() + TimeDelta::seconds(ttl_secs as i64),
            },
        );
        Ok(())
    }

    async fn get_current(&self, subject: SubjectId) -> Result<Option<String>, AuthError> {
        // The shard guard must be released before the remove below.
        let expired = match self.entries.get(&subject) {
            Some(entry) => {
                if entry.expires_at > Utc::now() {
                    return Ok(Some(entry.token_id.clone()));
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(&subject);
        }
        Ok(None)
    }

    async fn clear(&self, subject: SubjectId) -> Result<(), AuthError> {
        self.entries.remove(&subject);
        Ok(())
    }
}

impl PurgeExpired for MemorySessionRegistry {
    fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn last_write_wins_per_subject() {
        let registry = MemorySessionRegistry::new();
        let subject = SubjectId(Uuid::new_v4());

        registry.set_current(subject, "first", 60).await.unwrap();
        registry.set_current(subject, "second", 60).await.unwrap();

        assert_eq!(
            registry.get_current(subject).await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn entry_vanishes_after_ttl() {
        let registry = MemorySessionRegistry::new();
        let subject = SubjectId(Uuid::new_v4());

        registry.set_current(subject, "short", 0).await.unwrap();
        assert_eq!(registry.get_current(subject).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_removes_the_record() {
        let registry = MemorySessionRegistry::new();
        let subject = SubjectId(Uuid::new_v4());

        registry.set_current(subject, "id", 60).await.unwrap();
        registry.clear(subject).await.unwrap();
        assert_eq!(registry.get_current(subject).await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_entries() {
        let registry = MemorySessionRegistry::new();
        let live = SubjectId(Uuid::new_v4());
        let dead = SubjectId(Uuid::new_v4());

        registry.set_current(live, "live", 60).await.unwrap();
        registry.set_current(dead, "dead", 0).await.unwrap();

        assert_eq!(registry.purge_expired(), 1);
        assert!(registry.get_current(live).await.unwrap().is_some());
    }
}
