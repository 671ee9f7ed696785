//! Configuration parser for `clusters.yaml`.
//!
//! Loading happens in three steps: the YAML is parsed into a generic tree,
//! every `${VAR}` reference inside string values is replaced, and only then
//! is the tree deserialized into typed configuration.

use regex::Regex;
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::{ConfigError, ElastiformError, Result};

use super::spec::ElastiformConfig;

/// Matches `${VAR_NAME}` references.
#[allow(clippy::expect_used)]
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var pattern")
});

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["clusters.yaml", "clusters.yml"];

/// Configuration parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory `.env` is loaded from.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file, resolving `${VAR}` references
    /// against the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it
    /// references an unset variable.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ElastiformConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ElastiformError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ElastiformError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Ok(self
            .parse_yaml(&content, Some(path), |name| std::env::var(name).ok())?
            .with_config_dir(config_dir))
    }

    /// Parses configuration from a YAML string.
    ///
    /// `lookup` resolves variable names referenced as `${VAR}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, does not describe a
    /// configuration, or references a variable `lookup` cannot resolve.
    pub fn parse_yaml<F>(
        &self,
        content: &str,
        source: Option<&Path>,
        lookup: F,
    ) -> Result<ElastiformConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Parsing YAML configuration");
        let location = || source.map(|p| p.display().to_string());

        let mut tree: YamlValue = serde_yaml::from_str(content).map_err(|e| {
            ElastiformError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: location(),
            })
        })?;

        if tree.get("clusters").is_none() {
            return Err(ElastiformError::Config(ConfigError::ParseError {
                message: String::from("config file must contain a 'clusters' key"),
                location: location(),
            }));
        }

        interpolate_tree(&mut tree, &lookup)?;

        let config: ElastiformConfig = serde_yaml::from_value(tree).map_err(|e| {
            ElastiformError::Config(ConfigError::ParseError {
                message: format!("Invalid configuration: {e}"),
                location: location(),
            })
        })?;

        debug!("Parsed configuration with {} cluster(s)", config.clusters.len());
        Ok(config)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ElastiformError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Replaces every `${VAR}` reference in `value`.
///
/// # Errors
///
/// Returns `MissingEnvVar` for the first reference `lookup` cannot resolve.
pub fn interpolate_env_vars<F>(value: &str, lookup: F) -> std::result::Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(value.len());
    let mut last = 0;

    for captures in ENV_VAR_PATTERN.captures_iter(value) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let resolved = lookup(name.as_str()).ok_or_else(|| ConfigError::MissingEnvVar {
            name: name.as_str().to_string(),
        })?;
        output.push_str(&value[last..whole.start()]);
        output.push_str(&resolved);
        last = whole.end();
    }

    output.push_str(&value[last..]);
    Ok(output)
}

fn interpolate_tree<F>(value: &mut YamlValue, lookup: &F) -> std::result::Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        YamlValue::String(s) => *s = interpolate_env_vars(s, lookup)?,
        YamlValue::Sequence(items) => {
            for item in items {
                interpolate_tree(item, lookup)?;
            }
        }
        YamlValue::Mapping(entries) => {
            for (_, item) in entries.iter_mut() {
                interpolate_tree(item, lookup)?;
            }
        }
        YamlValue::Tagged(tagged) => interpolate_tree(&mut tagged.value, lookup)?,
        YamlValue::Null | YamlValue::Bool(_) | YamlValue::Number(_) => {}
    }
    Ok(())
}

/// Finds the configuration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ElastiformError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}
