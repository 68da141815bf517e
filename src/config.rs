//! Ingestion configuration.
//!
//! Configuration is read once, when an [`crate::pipeline::Ingestor`] is built, from either the
//! process environment (with `.env` support) or a JSON file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};

/// Default table-name prefix for remote ingestion.
pub const DEFAULT_PREFIX: &str = "CustomTable";

/// Default remote folder files are listed from.
pub const DEFAULT_REMOTE_FOLDER: &str = "api";

/// Relational store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// How long a statement waits on a locked database.
    #[serde(with = "secs")]
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ingest.db"),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Remote document store settings (SharePoint REST).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteConfig {
    /// Site URL, e.g. `https://contoso.sharepoint.com/sites/data`.
    pub site_url: String,
    /// Server-relative folder URL files are listed from.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// OAuth bearer token presented on every request.
    pub access_token: String,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout", with = "secs")]
    pub request_timeout: Duration,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Relational store.
    pub database: DatabaseConfig,
    /// Remote store; remote ingestion and downloads are unavailable when `None`.
    pub remote: Option<RemoteConfig>,
    /// Local cache directory for downloaded files.
    pub download_dir: PathBuf,
    /// Prefix used when the caller does not supply one.
    pub default_prefix: String,
    /// Overall deadline for one ingestion call.
    #[serde(with = "opt_secs")]
    pub timeout: Option<Duration>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            remote: None,
            download_dir: PathBuf::from("downloads"),
            default_prefix: DEFAULT_PREFIX.to_string(),
            timeout: None,
        }
    }
}

impl IngestConfig {
    /// Build a configuration from environment variables, loading `.env` first if present.
    ///
    /// Recognized variables: `SQL_DB`, `SHAREPOINT_SITE`, `SP_FOLDER_URL`, `SP_ACCESS_TOKEN`,
    /// `INGEST_DOWNLOAD_DIR`, `INGEST_DEFAULT_PREFIX`, `INGEST_TIMEOUT_SECS`. The remote store is
    /// configured only when both `SHAREPOINT_SITE` and `SP_ACCESS_TOKEN` are set.
    pub fn from_env() -> IngestionResult<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| IngestionError::Config {
            message: format!("{}: {e}", path.display()),
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IngestionResult<Self> {
        let mut config = Self::default();
        if let Some(db) = lookup("SQL_DB") {
            config.database.path = PathBuf::from(db);
        }
        if let Some(dir) = lookup("INGEST_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup("INGEST_DEFAULT_PREFIX") {
            config.default_prefix = prefix;
        }
        if let Some(secs) = lookup("INGEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| IngestionError::Config {
                message: format!("INGEST_TIMEOUT_SECS='{secs}': {e}"),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let (Some(site_url), Some(access_token)) = (lookup("SHAREPOINT_SITE"), lookup("SP_ACCESS_TOKEN")) {
            config.remote = Some(RemoteConfig {
                site_url,
                folder: lookup("SP_FOLDER_URL").unwrap_or_else(default_folder),
                access_token,
                request_timeout: default_request_timeout(),
            });
        }
        Ok(config)
    }

    /// The remote store settings, or a configuration error when absent.
    pub fn require_remote(&self) -> IngestionResult<&RemoteConfig> {
        self.remote.as_ref().ok_or_else(|| IngestionError::Config {
            message: "no remote store configured (set SHAREPOINT_SITE and SP_ACCESS_TOKEN)".to_string(),
        })
    }
}

fn default_folder() -> String {
    DEFAULT_REMOTE_FOLDER.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|v| v.map(Duration::from_secs))
    }
}
