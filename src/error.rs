//! Error types for the Elastiform reconciliation engine.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, resource loading, cluster transport, and planning.
//! Write failures during apply are not errors of the run itself; they are
//! recorded per item in the apply report.

use std::path::PathBuf;
use thiserror::Error;

use crate::resource::ResourceKind;

/// The main error type for Elastiform.
#[derive(Debug, Error)]
pub enum ElastiformError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource file errors. Fatal to the whole run.
    #[error("Resource file error: {0}")]
    Load(#[from] LoadError),

    /// Cluster transport errors.
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}. Run 'elastiform init' to create a starter project")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable referenced by the configuration is not set.
    #[error("Environment variable '{name}' is referenced in config but not set")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// The requested cluster is not defined.
    #[error("Cluster '{name}' not found in config. Available: {available}")]
    UnknownCluster {
        /// Requested cluster name.
        name: String,
        /// Comma-separated list of configured clusters.
        available: String,
    },
}

/// Errors raised while loading resource files from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is not valid JSON.
    #[error("Invalid JSON in {path}: {message} (line {line}, col {column})")]
    InvalidJson {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
    },

    /// The file holds valid JSON that is not an object.
    #[error("Resource file {path} must contain a JSON object, got {found}")]
    NotAnObject {
        /// Offending file.
        path: PathBuf,
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The file could not be read.
    #[error("Cannot read file {path}: {message}")]
    Unreadable {
        /// Offending file.
        path: PathBuf,
        /// Underlying IO message.
        message: String,
    },

    /// The resource name derived from the file name is not usable remotely.
    #[error("Invalid resource name '{name}' ({path}): {reason}")]
    InvalidName {
        /// Offending file.
        path: PathBuf,
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },
}

/// Cluster transport errors.
///
/// A resource that does not exist is never reported through this type;
/// the transport returns `None` for it instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    /// Authentication or authorization failed.
    #[error("Cluster authentication failed ({status}): {message}")]
    AuthenticationFailed {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Description of the auth failure.
        message: String,
    },

    /// The cluster rejected the request.
    #[error("Cluster request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the cluster.
        message: String,
    },

    /// Rate limited.
    #[error("Cluster rate limited the request, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with cluster: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// The request did not complete in time.
    #[error("Request to cluster timed out: {message}")]
    Timeout {
        /// Description of the request that timed out.
        message: String,
    },

    /// Invalid response from the cluster.
    #[error("Invalid response from cluster: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Current state of a resource could not be fetched and the run is
    /// configured to abort on fetch failures.
    #[error("Failed to fetch {kind} '{name}': {source}")]
    FetchFailed {
        /// Kind of the resource.
        kind: ResourceKind,
        /// Name of the resource.
        name: String,
        /// Underlying transport error.
        source: ClusterError,
    },

    /// The same resource was described twice.
    #[error("Duplicate {kind} name: {name}")]
    DuplicateResource {
        /// Kind of the resource.
        kind: ResourceKind,
        /// The duplicated name.
        name: String,
    },

    /// An update was routed to a kind that cannot be updated in place.
    /// Indicates an internal invariant breach.
    #[error("Refusing to update immutable {kind} '{name}'")]
    PolicyViolation {
        /// Kind of the resource.
        kind: ResourceKind,
        /// Name of the resource.
        name: String,
    },
}

/// Result type alias for Elastiform operations.
pub type Result<T> = std::result::Result<T, ElastiformError>;

impl ElastiformError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl ClusterError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::NetworkError { .. })
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            Self::NetworkError { .. } => Some(1),
            _ => None,
        }
    }
}
