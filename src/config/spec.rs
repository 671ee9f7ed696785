//! Configuration types for `clusters.yaml`.
//!
//! The file names the clusters Elastiform can reconcile against, how to
//! authenticate to each, and a few run settings shared by every command.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::planner::FetchErrorPolicy;

/// Default number of resources fetched concurrently during planning.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElastiformConfig {
    /// Directory holding the resource files. Relative paths are resolved
    /// against the directory of the configuration file.
    #[serde(default)]
    pub resource_dir: Option<PathBuf>,
    /// Run settings.
    #[serde(default)]
    pub settings: RunSettings,
    /// Clusters by name.
    pub clusters: BTreeMap<String, ClusterConfig>,
    /// Directory the configuration was loaded from.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSettings {
    /// Maximum number of concurrent fetches while planning.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// What to do when the current state of a resource cannot be fetched.
    #[serde(default)]
    pub fetch_errors: FetchErrorPolicy,
}

/// Connection settings for one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Base URL, e.g. `https://es.example.com:9200`.
    pub url: String,
    /// Credentials. Omit for clusters without security enabled.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// TLS settings.
    #[serde(default)]
    pub tls: TlsConfig,
}

/// Cluster credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// Encoded API key sent as `Authorization: ApiKey <key>`.
    ApiKey {
        /// The encoded key.
        api_key: String,
    },
    /// Bearer token.
    Bearer {
        /// The token.
        token: String,
    },
}

/// TLS settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsConfig {
    /// Verify the server certificate.
    #[serde(default = "default_true")]
    pub verify: bool,
    /// Additional PEM CA certificate to trust.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

const fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fetch_errors: FetchErrorPolicy::default(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify: true,
            ca_cert: None,
        }
    }
}

impl RunSettings {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ElastiformConfig {
    /// Looks up a cluster by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCluster` listing the configured names.
    pub fn cluster(&self, name: &str) -> Result<&ClusterConfig, ConfigError> {
        self.clusters
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCluster {
                name: name.to_string(),
                available: self.cluster_names().join(", "),
            })
    }

    /// Configured cluster names, sorted.
    #[must_use]
    pub fn cluster_names(&self) -> Vec<&str> {
        self.clusters.keys().map(String::as_str).collect()
    }

    /// Directory holding the resource files.
    #[must_use]
    pub fn resource_root(&self) -> PathBuf {
        match &self.resource_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.config_dir.join(dir),
            None => self.config_dir.clone(),
        }
    }

    /// Sets the directory relative paths are resolved against.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config_dir = dir.as_ref().to_path_buf();
        self
    }
}

impl AuthConfig {
    /// Authentication scheme name.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::ApiKey { .. } => "api_key",
            Self::Bearer { .. } => "bearer",
        }
    }
}

// Secrets stay out of logs and debug output.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::ApiKey { .. } => f.debug_struct("ApiKey").field("api_key", &"***").finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}
