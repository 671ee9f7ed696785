//! Desired resource descriptors.

use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use super::kind::ResourceKind;

/// Characters the cluster refuses in resource names.
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', '*', '?', '"', '<', '>', '|', ',', '#'];

/// Leading characters the cluster refuses in resource names.
const FORBIDDEN_NAME_PREFIXES: &[char] = &['_', '-', '+'];

/// The desired state of one resource, as described by a local file.
///
/// A descriptor never changes once built; planning reads it and the apply
/// step writes its body unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    kind: ResourceKind,
    name: String,
    body: Value,
    source: Option<PathBuf>,
}

impl ResourceDescriptor {
    /// Creates a descriptor for the given kind and name.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>, body: Value) -> Self {
        Self {
            kind,
            name: name.into(),
            body,
            source: None,
        }
    }

    /// Records the file this descriptor was read from.
    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Resource name, unique within its kind.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Desired body, exactly as written by the user.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// File the descriptor was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Checks that a name can be used in a cluster path.
///
/// # Errors
///
/// Returns the reason the name is rejected.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(String::from("name must not be empty"));
    }
    if name.starts_with(FORBIDDEN_NAME_PREFIXES) {
        return Err(format!(
            "name must not start with any of {FORBIDDEN_NAME_PREFIXES:?}"
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || FORBIDDEN_NAME_CHARS.contains(c))
    {
        return Err(format!("name contains forbidden character {c:?}"));
    }
    Ok(())
}
