use crate::application_port::AuthError;
use crate::domain_port::RevocationLedger;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Ledger keys are `{prefix}:bl:{token_id}` with a marker value. The TTL is
/// the token's remaining life, clamped to at least one second, so Redis
/// itself bounds the ledger to tokens that could still be replayed.
pub struct RedisRevocationLedger {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRevocationLedger {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRevocationLedger {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token_id: &str) -> String {
        format!("{}:bl:{}", self.prefix, token_id)
    }

    pub(crate) fn remaining_secs(expires_at: DateTime<Utc>) -> u64 {
        let secs = (expires_at - Utc::now()).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }
}

#[async_trait::async_trait]
impl RevocationLedger for RedisRevocationLedger {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, "1", Self::remaining_secs(expires_at))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, AuthError> {
        let key = self.key(token_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val.is_some())
    }
}
