use crate::application_port::*;
use crate::domain_model::{Principal, Role, SubjectId};
use chrono::{TimeDelta, Utc};

// Minimal fakes for wiring and API-shape work without signing keys or a
// store. Extend with configurable failures when needed.

#[derive(Debug)]
pub struct FakeRotationService;

impl FakeRotationService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl RotationService for FakeRotationService {
    async fn login(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        Ok(fake_pair(principal.subject))
    }

    async fn refresh(&self, presented: &str) -> Result<RotatedSession, AuthError> {
        let subject = parse_fake(presented, "fake-refresh-token:")?;
        Ok(RotatedSession {
            subject,
            tokens: fake_pair(subject),
        })
    }

    async fn logout(&self, presented: &str) -> Option<SubjectId> {
        parse_fake(presented, "fake-refresh-token:").ok()
    }
}

#[derive(Debug)]
pub struct FakeRequestAuthenticator;

impl FakeRequestAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl RequestAuthenticator for FakeRequestAuthenticator {
    async fn authenticate(&self, header: &str) -> Result<Principal, AuthError> {
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedToken)?;
        let subject = parse_fake(token, "fake-access-token:")?;
        Ok(Principal {
            subject,
            role: Role::User,
            email: None,
        })
    }
}

fn parse_fake(token: &str, prefix: &str) -> Result<SubjectId, AuthError> {
    token
        .strip_prefix(prefix)
        .and_then(|s| s.parse::<SubjectId>().ok())
        .ok_or(AuthError::MalformedToken)
}

fn fake_pair(subject: SubjectId) -> TokenPair {
    let now = Utc::now();
    TokenPair {
        access_token: AccessToken(format!("fake-access-token:{subject}")),
        access_expires_at: now + TimeDelta::minutes(15),
        refresh_token: RefreshToken(format!("fake-refresh-token:{subject}")),
        refresh_expires_at: now + TimeDelta::days(7),
    }
}
