use crate::application_port::AuthError;
use crate::domain_port::RevocationLedger;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use super::PurgeExpired;

/// Dashmap-backed ledger. Entries keep the same `max(1s, remaining life)`
/// horizon the Redis adapter gets from `SET .. EX`.
#[derive(Default)]
pub struct MemoryRevocationLedger {
    revoked: DashMap<String, DateTime<Utc>>,
}

impl MemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn horizon(expires_at: DateTime<Utc>) -> DateTime<Utc> {
        let floor = Utc::now() + TimeDelta::seconds(1);
        if expires_at > floor { expires_at } else { floor }
    }
}

#[async_trait::async_trait]
impl RevocationLedger for MemoryRevocationLedger {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        self.revoked
            .insert(token_id.to_string(), Self::horizon(expires_at));
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError> {
        let expired = match self.revoked.get(token_id) {
            Some(until) => {
                if *until > Utc::now() {
                    return Ok(true);
                }
                true
            }
            None => false,
        };
        if expired {
            self.revoked.remove(token_id);
        }
        Ok(false)
    }
}

impl PurgeExpired for MemoryRevocationLedger {
    fn purge_expired(&self) -> usize {
        let before = self.revoked.len();
        let now = Utc::now();
        self.revoked.retain(|_, until| *until > now);
        before - self.revoked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn revoked_id_is_reported_until_expiry() {
        let ledger = MemoryRevocationLedger::new();
        ledger
            .revoke("jti-1", Utc::now() + TimeDelta::minutes(10))
            .await
            .unwrap();

        assert!(ledger.is_revoked("jti-1").await.unwrap());
        assert!(!ledger.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn entry_expires_with_the_token_not_later() {
        let ledger = MemoryRevocationLedger::new();
        // An already-expired token still gets the 1s floor, then vanishes.
        ledger.revoke("stale", Utc::now()).await.unwrap();
        assert!(ledger.is_revoked("stale").await.unwrap());

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(!ledger.is_revoked("stale").await.unwrap());
    }

    #[tokio::test]
    async fn purge_drops_expired_entries() {
        let ledger = MemoryRevocationLedger::new();
        ledger
            .revoke("live", Utc::now() + TimeDelta::minutes(5))
            .await
            .unwrap();
        ledger.revoke("stale", Utc::now()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(ledger.purge_expired(), 1);
        assert!(ledger.is_revoked("live").await.unwrap());
    }
}
