//! Resource file discovery.
//!
//! Each kind has its own directory under the resource root holding one JSON
//! file per resource. The file stem is the resource name and the file body
//! is sent to the cluster as is.
//!
//! ```text
//! index_templates/logs.json
//! ilm_policies/hot-warm.json
//! indices/events-000001.json
//! ```

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{LoadError, Result};
use crate::planner::ResourceFilter;
use crate::resource::{validate_name, ResourceDescriptor, ResourceKind};

/// Loads resource descriptors from a directory tree.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    /// Resource root.
    root: PathBuf,
}

impl ResourceLoader {
    /// Creates a loader for the given resource root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resource root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every selected resource, stopping at the first bad file.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] encountered.
    pub fn discover(&self, filter: &ResourceFilter) -> Result<Vec<ResourceDescriptor>> {
        let mut descriptors = Vec::new();
        for (kind, path) in self.candidates(filter)? {
            descriptors.push(load_file(kind, &path)?);
        }
        info!(
            "Loaded {} resource(s) from {}",
            descriptors.len(),
            self.root.display()
        );
        Ok(descriptors)
    }

    /// Loads every selected resource, collecting all errors instead of
    /// stopping at the first one.
    ///
    /// # Errors
    ///
    /// Returns an error only if a kind directory cannot be listed.
    pub fn validate(
        &self,
        filter: &ResourceFilter,
    ) -> Result<(Vec<ResourceDescriptor>, Vec<LoadError>)> {
        let mut descriptors = Vec::new();
        let mut errors = Vec::new();
        for (kind, path) in self.candidates(filter)? {
            match load_file(kind, &path) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => errors.push(e),
            }
        }
        Ok((descriptors, errors))
    }

    /// Selected resource files in `(kind, name)` order.
    fn candidates(&self, filter: &ResourceFilter) -> Result<Vec<(ResourceKind, PathBuf)>> {
        let mut candidates = Vec::new();

        for kind in ResourceKind::ALL {
            let dir = self.root.join(kind.directory_name());
            if !dir.is_dir() {
                debug!("No {} directory at {}", kind, dir.display());
                continue;
            }

            let mut files = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                    files.push(path);
                }
            }
            files.sort();

            candidates.extend(
                files
                    .into_iter()
                    .filter(|path| filter.matches(kind, &stem(path)))
                    .map(|path| (kind, path)),
            );
        }

        Ok(candidates)
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn load_file(kind: ResourceKind, path: &Path) -> std::result::Result<ResourceDescriptor, LoadError> {
    let name = stem(path);
    validate_name(&name).map_err(|reason| LoadError::InvalidName {
        path: path.to_path_buf(),
        name: name.clone(),
        reason,
    })?;

    let content = fs::read_to_string(path).map_err(|e| LoadError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let body: Value = serde_json::from_str(&content).map_err(|e| LoadError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })?;

    if !body.is_object() {
        return Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
            found: json_type(&body),
        });
    }

    debug!("Loaded {kind}/{name} from {}", path.display());
    Ok(ResourceDescriptor::new(kind, name, body).with_source(path))
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ElastiformError;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn project() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "index_templates/logs.json", r#"{"index_patterns":["logs-*"]}"#);
        write(dir.path(), "index_templates/metrics.json", r#"{"index_patterns":["metrics-*"]}"#);
        write(dir.path(), "ilm_policies/hot-warm.json", r#"{"policy":{"phases":{}}}"#);
        write(dir.path(), "ingest_pipelines/README.md", "not a resource");
        dir
    }

    #[test]
    fn test_discover_in_kind_then_name_order() {
        let dir = project();
        let loaded = ResourceLoader::new(dir.path())
            .discover(&ResourceFilter::all())
            .expect("discover");
        let labels: Vec<String> = loaded.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec![
                "index_template/logs",
                "index_template/metrics",
                "lifecycle_policy/hot-warm",
            ]
        );
        assert_eq!(
            loaded[0].source(),
            Some(dir.path().join("index_templates/logs.json").as_path())
        );
    }

    #[test]
    fn test_discover_applies_filter() {
        let dir = project();
        let filter = ResourceFilter::all()
            .with_kinds([ResourceKind::IndexTemplate])
            .with_names(["metrics"]);
        let loaded = ResourceLoader::new(dir.path())
            .discover(&filter)
            .expect("discover");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "metrics");
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = project();
        write(dir.path(), "component_templates/broken.json", "{ \"template\": ");
        let err = ResourceLoader::new(dir.path())
            .discover(&ResourceFilter::all())
            .expect_err("invalid json");
        assert!(matches!(
            err,
            ElastiformError::Load(LoadError::InvalidJson { line: 1, .. })
        ));
    }

    #[test]
    fn test_validate_collects_every_error() {
        let dir = project();
        write(dir.path(), "component_templates/broken.json", "{");
        write(dir.path(), "ingest_pipelines/list.json", "[1, 2]");
        write(dir.path(), "indices/_hidden.json", "{}");

        let (loaded, errors) = ResourceLoader::new(dir.path())
            .validate(&ResourceFilter::all())
            .expect("validate");
        assert_eq!(loaded.len(), 3);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, LoadError::NotAnObject { found: "an array", .. })));
        assert!(errors.iter().any(|e| matches!(e, LoadError::InvalidName { .. })));
    }

    #[test]
    fn test_empty_root_loads_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = ResourceLoader::new(dir.path())
            .discover(&ResourceFilter::all())
            .expect("discover");
        assert!(loaded.is_empty());
    }
}
