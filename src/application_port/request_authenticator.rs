use crate::domain_model::Principal;

use super::AuthError;

/// Validates the bearer credential of a protected request and resolves the
/// caller. Every failure mode collapses to the same 401 at the API boundary.
#[async_trait::async_trait]
pub trait RequestAuthenticator: Send + Sync {
    /// `header` is the raw `Authorization` header value, `Bearer` prefix
    /// included.
    async fn authenticate(&self, header: &str) -> Result<Principal, AuthError>;
}
