//! End-to-end exercises of the rotation protocol against the in-memory
//! adapters: one-time refresh use, replay rejection, ledger lifetime, and
//! fail-closed behavior on store outage.

use chrono::TimeDelta;
use gatehouse::application_impl::{BearerAuthenticator, JwtConfig, JwtHs256Issuer, RealRotationService};
use gatehouse::application_port::*;
use gatehouse::domain_model::{Principal, Role, SubjectId};
use gatehouse::domain_port::*;
use gatehouse::infra_memory::{
    MemoryPrincipalDirectory, MemoryRevocationLedger, MemorySessionRegistry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

#[derive(Default)]
struct CountingMetrics {
    logins: AtomicUsize,
    rotations: AtomicUsize,
    reuse_detections: AtomicUsize,
}

impl AuthMetrics for CountingMetrics {
    fn on_login(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }
    fn on_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }
    fn on_reuse_detected(&self) {
        self.reuse_detections.fetch_add(1, Ordering::Relaxed);
    }
}

struct Stack {
    issuer: Arc<JwtHs256Issuer>,
    registry: Arc<MemorySessionRegistry>,
    ledger: Arc<MemoryRevocationLedger>,
    directory: Arc<MemoryPrincipalDirectory>,
    metrics: Arc<CountingMetrics>,
    rotation: RealRotationService,
}

fn jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: "gatehouse.test".to_string(),
        access_ttl: TimeDelta::minutes(15),
        refresh_ttl: TimeDelta::days(7),
        access_secret: b"it-access-secret".to_vec(),
        access_legacy_secrets: vec![],
        refresh_secret: b"it-refresh-secret".to_vec(),
    }
}

fn stack_with(cfg: JwtConfig) -> Stack {
    let issuer = Arc::new(JwtHs256Issuer::new(cfg).unwrap());
    let registry = Arc::new(MemorySessionRegistry::new());
    let ledger = Arc::new(MemoryRevocationLedger::new());
    let directory = Arc::new(MemoryPrincipalDirectory::new());
    let metrics = Arc::new(CountingMetrics::default());
    let rotation = RealRotationService::new(
        issuer.clone(),
        registry.clone(),
        ledger.clone(),
        metrics.clone(),
    );
    Stack {
        issuer,
        registry,
        ledger,
        directory,
        metrics,
        rotation,
    }
}

fn stack() -> Stack {
    stack_with(jwt_config())
}

fn principal() -> Principal {
    Principal {
        subject: SubjectId(Uuid::new_v4()),
        role: Role::User,
        email: Some("it@example.com".to_string()),
    }
}

fn assert_reuse(err: AuthError) {
    assert!(matches!(err, AuthError::ReuseDetected), "got {err:?}");
}

#[tokio::test]
async fn refresh_token_rotates_exactly_once() {
    let s = stack();
    let pair = s.rotation.login(&principal()).await.unwrap();
    let r1 = pair.refresh_token.0;

    assert!(s.rotation.refresh(&r1).await.is_ok());
    assert_reuse(s.rotation.refresh(&r1).await.unwrap_err());
    assert_eq!(s.metrics.reuse_detections.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn consumed_tokens_stay_dead_across_the_chain() {
    let s = stack();
    let p = principal();

    let r1 = s.rotation.login(&p).await.unwrap().refresh_token.0;
    let r2 = s.rotation.refresh(&r1).await.unwrap().tokens.refresh_token.0;
    let r3 = s.rotation.refresh(&r2).await.unwrap().tokens.refresh_token.0;

    // R1 and R2 were each consumed by their rotation; the ledger keeps them
    // dead regardless of what the registry now says.
    assert_reuse(s.rotation.refresh(&r1).await.unwrap_err());
    assert_reuse(s.rotation.refresh(&r2).await.unwrap_err());

    // The head of the chain still rotates.
    assert!(s.rotation.refresh(&r3).await.is_ok());
    assert_eq!(s.metrics.rotations.load(Ordering::Relaxed), 3);
}

#[tokio::test]
async fn registry_tracks_exactly_one_current_id() {
    let s = stack();
    let p = principal();

    let r1 = s.rotation.login(&p).await.unwrap().refresh_token.0;
    let after_login = s.registry.get_current(p.subject).await.unwrap().unwrap();

    let rotated = s.rotation.refresh(&r1).await.unwrap();
    let after_rotation = s.registry.get_current(p.subject).await.unwrap().unwrap();

    assert_ne!(after_login, after_rotation);
    let id_of_r2 = s
        .issuer
        .verify_refresh(&rotated.tokens.refresh_token.0)
        .await
        .unwrap()
        .id;
    assert_eq!(after_rotation, id_of_r2);
}

#[tokio::test]
async fn second_login_displaces_the_first_chain() {
    let s = stack();
    let p = principal();

    let r_first = s.rotation.login(&p).await.unwrap().refresh_token.0;
    let r_second = s.rotation.login(&p).await.unwrap().refresh_token.0;

    // Both logins succeeded; only the later chain survives its next rotation.
    assert_reuse(s.rotation.refresh(&r_first).await.unwrap_err());
    assert!(s.rotation.refresh(&r_second).await.is_ok());
    assert_eq!(s.metrics.logins.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn logout_blacklists_but_leaves_the_registry_entry() {
    let s = stack();
    let p = principal();

    let pair = s.rotation.login(&p).await.unwrap();
    let r1 = pair.refresh_token.0;
    let r1_id = s.issuer.verify_refresh(&r1).await.unwrap().id;

    assert_eq!(s.rotation.logout(&r1).await, Some(p.subject));

    // Decision under test: the registry still names the logged-out id as
    // current, but the ledger entry makes any rotation attempt fail.
    assert_eq!(
        s.registry.get_current(p.subject).await.unwrap(),
        Some(r1_id.clone())
    );
    assert!(s.ledger.is_revoked(&r1_id).await.unwrap());
    assert_reuse(s.rotation.refresh(&r1).await.unwrap_err());
}

#[tokio::test]
async fn logout_is_quiet_for_garbage_tokens() {
    let s = stack();
    assert_eq!(s.rotation.logout("not-a-jwt").await, None);
}

#[tokio::test]
async fn logout_accepts_an_expired_refresh_token() {
    let mut cfg = jwt_config();
    cfg.refresh_ttl = TimeDelta::seconds(-30);
    let s = stack_with(cfg);
    let p = principal();

    let r1 = s.rotation.login(&p).await.unwrap().refresh_token.0;
    assert_eq!(s.rotation.logout(&r1).await, Some(p.subject));
}

#[tokio::test]
async fn access_token_survives_logout_of_its_sibling_refresh() {
    let s = stack();
    let p = principal();
    s.directory.insert(PrincipalRecord {
        subject: p.subject,
        email: "it@example.com".to_string(),
        role: p.role,
        password_hash: String::new(),
        is_active: true,
    });
    let authenticator = BearerAuthenticator::new(
        s.issuer.clone(),
        s.ledger.clone(),
        s.directory.clone(),
        s.metrics.clone(),
    );

    let pair = s.rotation.login(&p).await.unwrap();
    assert_eq!(s.rotation.logout(&pair.refresh_token.0).await, Some(p.subject));

    // Documented behavior: logout revokes the refresh id only. The sibling
    // access token has its own id, was never ledgered, and stays valid until
    // it expires on its own.
    let header = format!("Bearer {}", pair.access_token.0);
    let resolved = authenticator.authenticate(&header).await.unwrap();
    assert_eq!(resolved.subject, p.subject);
}

#[tokio::test]
async fn ledger_entry_expires_with_the_token_it_tracks() {
    let mut cfg = jwt_config();
    cfg.refresh_ttl = TimeDelta::seconds(2);
    let s = stack_with(cfg);

    let r1 = s.rotation.login(&principal()).await.unwrap().refresh_token.0;
    let r1_id = s.issuer.verify_refresh(&r1).await.unwrap().id;

    s.rotation.refresh(&r1).await.unwrap();
    assert!(s.ledger.is_revoked(&r1_id).await.unwrap());

    // JWT `exp` has whole-second granularity, so sleep a full second past the
    // 2s TTL to guarantee the integer-truncated clock has moved beyond it.
    tokio::time::sleep(std::time::Duration::from_millis(3300)).await;

    // The entry is gone precisely because the token it tracked can no longer
    // be replayed: verification now fails on expiry alone.
    assert!(!s.ledger.is_revoked(&r1_id).await.unwrap());
    assert!(matches!(
        s.issuer.verify_refresh(&r1).await.unwrap_err(),
        AuthError::ExpiredToken
    ));
}

// region fail-closed

struct BrokenRegistry;

#[async_trait::async_trait]
impl SessionRegistry for BrokenRegistry {
    async fn set_current(&self, _: SubjectId, _: &str, _: u64) -> Result<(), AuthError> {
        Err(AuthError::Store("connection refused".to_string()))
    }
    async fn get_current(&self, _: SubjectId) -> Result<Option<String>, AuthError> {
        Err(AuthError::Store("connection refused".to_string()))
    }
    async fn clear(&self, _: SubjectId) -> Result<(), AuthError> {
        Err(AuthError::Store("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_outage_fails_closed() {
    let issuer = Arc::new(JwtHs256Issuer::new(jwt_config()).unwrap());
    let healthy = stack();

    let r1 = healthy.rotation.login(&principal()).await.unwrap().refresh_token.0;

    let broken = RealRotationService::new(
        issuer,
        Arc::new(BrokenRegistry),
        healthy.ledger.clone(),
        Arc::new(NoopAuthMetrics),
    );

    // A registry outage must surface as an error, never as a minted pair.
    let err = broken.refresh(&r1).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(_)), "got {err:?}");

    let err = broken.login(&principal()).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(_)), "got {err:?}");
}

// endregion
