use crate::domain_model::{Principal, SubjectId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Failure taxonomy for the credential subsystem. The API layer collapses
/// everything token-related into one uniform 401; the distinctions exist for
/// server-side logs and tests only. `Store` must always fail closed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token")]
    MalformedToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("token type mismatch")]
    TypeMismatch,
    #[error("refresh token reused or revoked")]
    ReuseDetected,
    #[error("principal not found")]
    UnknownPrincipal,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

/// What login and refresh hand back: a fresh pair plus both expiries.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_expires_at: DateTime<Utc>,
}

/// A successful rotation, with the subject it belongs to. The subject stays
/// out of [`TokenPair`] so the wire shape of refresh matches login exactly.
#[derive(Debug, Clone)]
pub struct RotatedSession {
    pub subject: SubjectId,
    pub tokens: TokenPair,
}

/// The login / refresh / logout state machine. Per subject the conceptual
/// states are NO_SESSION and ACTIVE(refresh_id); the registry holds the id of
/// the only refresh token currently allowed to rotate.
#[async_trait::async_trait]
pub trait RotationService: Send + Sync {
    /// Mint a pair for an already-authenticated principal and record the new
    /// refresh id as current. Credential checks happen before this call.
    async fn login(&self, principal: &Principal) -> Result<TokenPair, AuthError>;

    /// Exchange a valid, still-current refresh token for a new pair,
    /// consuming it. A second presentation of the same token must fail with
    /// `ReuseDetected`.
    async fn refresh(&self, presented: &str) -> Result<RotatedSession, AuthError>;

    /// Blacklist the presented refresh token. Tolerant: an unverifiable or
    /// expired token is logged and ignored, never surfaced to the caller.
    /// Returns the subject when the token verified, for event fan-out.
    async fn logout(&self, presented: &str) -> Option<SubjectId>;
}
