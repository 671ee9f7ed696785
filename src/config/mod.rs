//! Configuration module for Elastiform.
//!
//! This module handles all configuration-related functionality:
//! - Parsing `clusters.yaml` with `${VAR}` interpolation
//! - Loading `.env` files next to the configuration
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{find_config_file, interpolate_env_vars, ConfigParser, DEFAULT_CONFIG_FILES};
pub use spec::{
    AuthConfig, ClusterConfig, ElastiformConfig, RunSettings, TlsConfig, DEFAULT_CONCURRENCY,
    DEFAULT_TIMEOUT_SECS,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
