use crate::application_port::AuthError;
use crate::domain_model::SubjectId;

/// Maps a subject to the id of its currently valid refresh token. Backed by a
/// TTL-capable store; the entry self-expires in lockstep with the token it
/// tracks, so normal expiry needs no delete.
///
/// Last-write-wins is load-bearing: two near-simultaneous logins both mint
/// tokens, but only the later `set_current` survives, and the earlier chain
/// dies at its next rotation attempt. Exactly one live chain per subject.
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn set_current(
        &self,
        subject: SubjectId,
        token_id: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError>;

    async fn get_current(&self, subject: SubjectId) -> Result<Option<String>, AuthError>;

    /// Administrative revocation only; never called on the normal paths.
    async fn clear(&self, subject: SubjectId) -> Result<(), AuthError>;
}
