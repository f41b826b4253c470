use crate::application_port::AuthError;
use crate::domain_model::SubjectId;
use crate::domain_port::SessionRegistry;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Registry keys are `{prefix}:rt:{subject}`; the value is the current
/// refresh id. `SET .. EX` gives both last-write-wins and the TTL that keeps
/// the record in lockstep with its token.
pub struct RedisSessionRegistry {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionRegistry {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionRegistry {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, subject: SubjectId) -> String {
        format!("{}:rt:{}", self.prefix, subject)
    }
}

#[async_trait::async_trait]
impl SessionRegistry for RedisSessionRegistry {
    async fn set_current(
        &self,
        subject: SubjectId,
        token_id: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        let key = self.key(subject);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, token_id, ttl_secs)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get_current(&self, subject: SubjectId) -> Result<Option<String>, AuthError> {
        let key = self.key(subject);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn clear(&self, subject: SubjectId) -> Result<(), AuthError> {
        let key = self.key(subject);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}
