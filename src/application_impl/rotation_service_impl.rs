use crate::application_port::{
    AccessToken, AuthError, AuthMetrics, RefreshToken, RotatedSession, RotationService,
    TokenIssuer, TokenPair,
};
use crate::domain_model::{Principal, SubjectId};
use crate::domain_port::{RevocationLedger, SessionRegistry};
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Orchestrates issuer, registry and ledger into the one-time-use rotation
/// protocol. All store calls are single request-scoped round trips; there is
/// no in-process locking, and no retry on store failure (fail closed).
pub struct RealRotationService {
    issuer: Arc<dyn TokenIssuer>,
    registry: Arc<dyn SessionRegistry>,
    ledger: Arc<dyn RevocationLedger>,
    metrics: Arc<dyn AuthMetrics>,
}

impl RealRotationService {
    pub fn new(
        issuer: Arc<dyn TokenIssuer>,
        registry: Arc<dyn SessionRegistry>,
        ledger: Arc<dyn RevocationLedger>,
        metrics: Arc<dyn AuthMetrics>,
    ) -> Self {
        Self {
            issuer,
            registry,
            ledger,
            metrics,
        }
    }

    /// Registry TTL tracks the refresh token's remaining life, so the record
    /// self-expires with the token it names.
    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let secs = (until - Utc::now()).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }

    /// Mint a pair and make the new refresh id the subject's current one.
    /// Last write wins at the registry.
    async fn issue_pair_and_register(
        &self,
        principal: &Principal,
    ) -> Result<TokenPair, AuthError> {
        let access = self.issuer.issue_access(principal).await?;
        let refresh = self.issuer.issue_refresh(principal).await?;

        self.registry
            .set_current(
                principal.subject,
                &refresh.id,
                Self::ttl_secs(refresh.expires_at),
            )
            .await?;

        Ok(TokenPair {
            access_token: AccessToken(access.token),
            access_expires_at: access.expires_at,
            refresh_token: RefreshToken(refresh.token),
            refresh_expires_at: refresh.expires_at,
        })
    }
}

#[async_trait::async_trait]
impl RotationService for RealRotationService {
    async fn login(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        let pair = self.issue_pair_and_register(principal).await?;
        self.metrics.on_login();
        info!(subject = %principal.subject, "session started");
        Ok(pair)
    }

    async fn refresh(&self, presented: &str) -> Result<RotatedSession, AuthError> {
        let claims = self.issuer.verify_refresh(presented).await?;

        // Consumed or logged-out ids sit in the ledger until they would have
        // expired anyway.
        if self.ledger.is_revoked(&claims.id).await? {
            warn!(subject = %claims.subject, "refresh replay rejected: id is ledger-revoked");
            self.metrics.on_reuse_detected();
            return Err(AuthError::ReuseDetected);
        }

        // Only the registry's current id may rotate. Anything else is a
        // replaced chain or a replay.
        match self.registry.get_current(claims.subject).await? {
            Some(ref current) if *current == claims.id => {}
            _ => {
                warn!(subject = %claims.subject, "refresh replay rejected: registry mismatch");
                self.metrics.on_reuse_detected();
                return Err(AuthError::ReuseDetected);
            }
        }

        // Consume before the new pair exists. After this line the old token
        // is dead even if everything below fails.
        self.ledger.revoke(&claims.id, claims.expires_at).await?;

        // The refresh token carries enough claims to rebuild the principal;
        // no directory round trip on the hot rotation path.
        let principal = Principal {
            subject: claims.subject,
            role: claims.role,
            email: None,
        };
        let pair = self.issue_pair_and_register(&principal).await?;

        self.metrics.on_rotation();
        info!(subject = %claims.subject, "session rotated");
        Ok(RotatedSession {
            subject: claims.subject,
            tokens: pair,
        })
    }

    async fn logout(&self, presented: &str) -> Option<SubjectId> {
        // Tolerant on purpose: a token on its way out may already be expired,
        // and an unverifiable one must not leak whether a session existed.
        let claims = match self.issuer.verify_refresh_expired_ok(presented).await {
            Ok(claims) => claims,
            Err(e) => {
                debug!("logout with unverifiable refresh token: {e}");
                return None;
            }
        };

        if let Err(e) = self.ledger.revoke(&claims.id, claims.expires_at).await {
            warn!(subject = %claims.subject, "logout revocation not recorded: {e}");
            return None;
        }

        // The registry entry is left in place. It still names the revoked id,
        // so the next rotation attempt dies on the ledger check, and the
        // record evaporates on its own TTL.
        self.metrics.on_logout();
        info!(subject = %claims.subject, "session ended");
        Some(claims.subject)
    }
}
