use crate::domain_model::{Principal, Role, SubjectId};
use chrono::{DateTime, Utc};

use super::AuthError;

/// A freshly signed token plus the id embedded in it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

/// Verified claims of an access token.
#[derive(Debug, Clone)]
pub struct AccessVerification {
    pub subject: SubjectId,
    pub role: Role,
    pub email: Option<String>,
    /// Tokens minted here always carry an id; `None` tolerates foreign-minted
    /// tokens that omit it, which then skip the revocation check.
    pub id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Verified claims of a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshVerification {
    pub subject: SubjectId,
    pub role: Role,
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

/// Stateless issuance and verification of signed tokens. Access and refresh
/// tokens use independent keys, so neither kind verifies where the other is
/// expected even if the type claim were forged. Every issuance embeds a fresh
/// unique id.
#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_access(&self, principal: &Principal) -> Result<IssuedToken, AuthError>;

    async fn issue_refresh(&self, principal: &Principal) -> Result<IssuedToken, AuthError>;

    async fn verify_access(&self, token: &str) -> Result<AccessVerification, AuthError>;

    async fn verify_refresh(&self, token: &str) -> Result<RefreshVerification, AuthError>;

    /// Logout path: check signature and type only, tolerating an already
    /// expired token on its way out.
    async fn verify_refresh_expired_ok(&self, token: &str)
    -> Result<RefreshVerification, AuthError>;
}
