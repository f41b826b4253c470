use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::SubjectId;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::{BroadcastPublisher, EventPublisher, Sweeper};
use crate::settings::Settings;
use chrono::TimeDelta;
use nanoid::nanoid;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

pub struct Server {
    pub rotation_service: Arc<dyn RotationService>,
    pub request_authenticator: Arc<dyn RequestAuthenticator>,
    pub principal_directory: Arc<dyn PrincipalDirectory>,
    pub credential_hasher: Arc<dyn CredentialHasher>,
    pub event_publisher: Arc<dyn EventPublisher>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);
        info!(run_id, "wiring server");

        // Counters are an injected seam; the binary runs without any.
        let metrics: Arc<dyn AuthMetrics> = Arc::new(NoopAuthMetrics);

        let issuer: Arc<dyn TokenIssuer> =
            Arc::new(JwtHs256Issuer::new(issuer_config(settings))?);

        let mut purgeable: Vec<Arc<dyn PurgeExpired>> = Vec::new();
        let (registry, ledger): (Arc<dyn SessionRegistry>, Arc<dyn RevocationLedger>) =
            match settings.store.backend.as_str() {
                "redis" => {
                    let url = settings
                        .store
                        .redis_url
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("store.redis_url required"))?;
                    let client = redis::Client::open(url)?;
                    let manager = client.get_connection_manager().await?;
                    let prefix = settings.store.key_prefix.clone();
                    (
                        Arc::new(RedisSessionRegistry::new(manager.clone(), prefix.clone())),
                        Arc::new(RedisRevocationLedger::new(manager, prefix)),
                    )
                }
                "memory" => {
                    let registry = Arc::new(MemorySessionRegistry::new());
                    let ledger = Arc::new(MemoryRevocationLedger::new());
                    purgeable.push(registry.clone());
                    purgeable.push(ledger.clone());
                    (registry, ledger)
                }
                other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
            };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let mut pool = None;
        let principal_directory: Arc<dyn PrincipalDirectory> =
            match settings.directory.backend.as_str() {
                "mysql" => {
                    let dsn = settings
                        .directory
                        .mysql_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("directory.mysql_dsn required"))?;
                    let p = Pool::<MySql>::connect(dsn).await?;
                    pool = Some(p.clone());
                    Arc::new(MySqlPrincipalDirectory::new(p))
                }
                "memory" => {
                    let directory = Arc::new(MemoryPrincipalDirectory::new());
                    for seed in &settings.directory.seed {
                        let password_hash =
                            credential_hasher.hash_password(&seed.password).await?;
                        directory.insert(PrincipalRecord {
                            subject: SubjectId(Uuid::new_v4()),
                            email: seed.email.clone(),
                            role: seed.role,
                            password_hash,
                            is_active: true,
                        });
                    }
                    directory
                }
                other => return Err(anyhow::anyhow!("Unknown directory backend: {}", other)),
            };

        let (rotation_service, request_authenticator): (
            Arc<dyn RotationService>,
            Arc<dyn RequestAuthenticator>,
        ) = match settings.auth.backend.as_str() {
            "fake" => (
                Arc::new(FakeRotationService::new()),
                Arc::new(FakeRequestAuthenticator::new()),
            ),
            "real" => (
                Arc::new(RealRotationService::new(
                    issuer.clone(),
                    registry.clone(),
                    ledger.clone(),
                    metrics.clone(),
                )),
                Arc::new(BearerAuthenticator::new(
                    issuer,
                    ledger,
                    principal_directory.clone(),
                    metrics,
                )),
            ),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let event_publisher: Arc<dyn EventPublisher> = Arc::new(BroadcastPublisher::new(256));

        let cancel = CancellationToken::new();
        let sweeper_handle = if purgeable.is_empty() {
            None
        } else {
            let sweeper = Sweeper::new(purgeable, SWEEP_PERIOD, cancel.clone());
            Some(tokio::spawn(sweeper.run()))
        };

        info!("server started");

        Ok(Self {
            rotation_service,
            request_authenticator,
            principal_directory,
            credential_hasher,
            event_publisher,
            sweeper_handle: Mutex::new(sweeper_handle),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.sweeper_handle.lock().ok().and_then(|mut l| l.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Settings plus the env overrides the original deployment relied on.
fn issuer_config(settings: &Settings) -> JwtConfig {
    let access_secret = std::env::var("JWT_ACCESS_SECRET")
        .unwrap_or_else(|_| settings.auth.access_secret.clone())
        .into_bytes();
    let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
        .unwrap_or_else(|_| settings.auth.refresh_secret.clone())
        .into_bytes();

    JwtConfig {
        issuer: settings.auth.issuer.clone(),
        access_ttl: TimeDelta::seconds(settings.auth.access_ttl_secs),
        refresh_ttl: TimeDelta::seconds(settings.auth.refresh_ttl_secs),
        access_secret,
        access_legacy_secrets: settings
            .auth
            .access_legacy_secrets
            .iter()
            .map(|s| s.clone().into_bytes())
            .collect(),
        refresh_secret,
    }
}
