use crate::application_port::{AuthError, AuthMetrics, RequestAuthenticator, TokenIssuer};
use crate::domain_model::Principal;
use crate::domain_port::{PrincipalDirectory, RevocationLedger};
use crate::logger::*;
use std::sync::Arc;

/// Per-request bearer validation: ordered-key signature check, type check,
/// ledger lookup for early revocation, then principal resolution against the
/// external directory.
pub struct BearerAuthenticator {
    issuer: Arc<dyn TokenIssuer>,
    ledger: Arc<dyn RevocationLedger>,
    directory: Arc<dyn PrincipalDirectory>,
    metrics: Arc<dyn AuthMetrics>,
}

impl BearerAuthenticator {
    pub fn new(
        issuer: Arc<dyn TokenIssuer>,
        ledger: Arc<dyn RevocationLedger>,
        directory: Arc<dyn PrincipalDirectory>,
        metrics: Arc<dyn AuthMetrics>,
    ) -> Self {
        Self {
            issuer,
            ledger,
            directory,
            metrics,
        }
    }

    async fn check(&self, header: &str) -> Result<Principal, AuthError> {
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedToken)?;

        let claims = self.issuer.verify_access(token).await?;

        // Access tokens are stateless except for this: an id present in the
        // ledger means the token was revoked ahead of its natural expiry.
        if let Some(id) = &claims.id {
            if self.ledger.is_revoked(id).await? {
                return Err(AuthError::ReuseDetected);
            }
        }

        self.directory
            .find_by_subject(claims.subject)
            .await?
            .ok_or(AuthError::UnknownPrincipal)
    }
}

#[async_trait::async_trait]
impl RequestAuthenticator for BearerAuthenticator {
    async fn authenticate(&self, header: &str) -> Result<Principal, AuthError> {
        match self.check(header).await {
            Ok(principal) => {
                self.metrics.on_authenticated();
                Ok(principal)
            }
            Err(e) => {
                // Detail stays server-side; the caller sees a uniform 401.
                debug!("request rejected: {e}");
                self.metrics.on_rejected();
                Err(e)
            }
        }
    }
}
