//! Configuration validation for `clusters.yaml`.
//!
//! Structural problems are caught by deserialization; this pass checks the
//! values themselves and flags risky but legal setups as warnings.

use tracing::debug;

use crate::error::{ConfigError, ElastiformError, Result};

use super::spec::{AuthConfig, ClusterConfig, ElastiformConfig};

/// Upper bound for the fetch concurrency setting.
const MAX_CONCURRENCY: usize = 64;

/// Validator for cluster configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all issues found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, if any. Use [`Self::check`] to
    /// collect every issue.
    pub fn validate(&self, config: &ElastiformConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        match result.errors.first() {
            None => {
                debug!("Configuration validation passed");
                Ok(result)
            }
            Some(first) => Err(ElastiformError::Config(ConfigError::validation(
                first.message.clone(),
                first.field.clone(),
            ))),
        }
    }

    /// Collects every error and warning in a configuration.
    #[must_use]
    pub fn check(&self, config: &ElastiformConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        if config.clusters.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("clusters"),
                message: String::from("at least one cluster must be defined"),
            });
        }

        if config.settings.concurrency == 0 || config.settings.concurrency > MAX_CONCURRENCY {
            result.errors.push(ValidationError {
                field: String::from("settings.concurrency"),
                message: format!("concurrency must be between 1 and {MAX_CONCURRENCY}"),
            });
        }

        if config.settings.timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("settings.timeout_secs"),
                message: String::from("timeout must be at least 1 second"),
            });
        }

        for (name, cluster) in &config.clusters {
            Self::validate_cluster(name, cluster, &mut result);
        }

        result
    }

    fn validate_cluster(name: &str, cluster: &ClusterConfig, result: &mut ValidationResult) {
        let field = |suffix: &str| format!("clusters.{name}.{suffix}");
        let url = cluster.url.trim();

        if url.is_empty() {
            result.errors.push(ValidationError {
                field: field("url"),
                message: String::from("url must not be empty"),
            });
            return;
        }

        let plain_http = url.starts_with("http://");
        if !plain_http && !url.starts_with("https://") {
            result.errors.push(ValidationError {
                field: field("url"),
                message: format!("url '{url}' must start with http:// or https://"),
            });
        }

        if let Some(auth) = &cluster.auth {
            if let Some(missing) = Self::empty_credential(auth) {
                result.errors.push(ValidationError {
                    field: field(&format!("auth.{missing}")),
                    message: format!("{} auth requires a non-empty '{missing}'", auth.scheme()),
                });
            }
            if plain_http {
                result.warnings.push(format!(
                    "cluster '{name}' sends {} credentials over plain http",
                    auth.scheme()
                ));
            }
        }

        if !cluster.tls.verify {
            result
                .warnings
                .push(format!("cluster '{name}' has TLS certificate verification disabled"));
        }

        if let Some(ca_cert) = &cluster.tls.ca_cert {
            if !ca_cert.exists() {
                result.errors.push(ValidationError {
                    field: field("tls.ca_cert"),
                    message: format!("CA certificate not found: {}", ca_cert.display()),
                });
            }
        }
    }

    fn empty_credential(auth: &AuthConfig) -> Option<&'static str> {
        match auth {
            AuthConfig::Basic { username, .. } if username.is_empty() => Some("username"),
            AuthConfig::Basic { password, .. } if password.is_empty() => Some("password"),
            AuthConfig::ApiKey { api_key } if api_key.is_empty() => Some("api_key"),
            AuthConfig::Bearer { token } if token.is_empty() => Some("token"),
            _ => None,
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
