use crate::application_port::AuthError;
use chrono::{DateTime, Utc};

/// Token-id blacklist. An entry lives for `max(1, expires_at - now)` seconds,
/// exactly the window in which the original token could still be replayed, so
/// the ledger is bounded by the set of not-yet-expired tokens and never needs
/// manual garbage collection. Entries are never deleted early.
#[async_trait::async_trait]
pub trait RevocationLedger: Send + Sync {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError>;

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError>;
}
