use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

use crate::domain_model::Role;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub directory: Directory,
    pub http: Http,
    pub log: Log,
    pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "real"
    pub issuer: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub access_secret: String,
    /// Older access-verification secrets kept valid during a key rollover,
    /// highest priority first.
    #[serde(default)]
    pub access_legacy_secrets: Vec<String>,
    pub refresh_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "redis"
    pub redis_url: Option<String>,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Directory {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
    /// Principals created in the memory directory at boot. Dev only.
    #[serde(default)]
    pub seed: Vec<SeedPrincipal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPrincipal {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
