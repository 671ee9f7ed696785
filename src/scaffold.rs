//! Starter project layout for `elastiform init`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::resource::ResourceKind;

const CLUSTERS_TEMPLATE: &str = include_str!("../templates/clusters.yaml");
const EXAMPLE_INDEX_TEMPLATE: &str = include_str!("../templates/example-logs.json");
const GITIGNORE_TEMPLATE: &str = include_str!("../templates/gitignore");

/// Creates the resource directories and starter files under `directory`.
///
/// Existing files are left untouched. Returns the paths that were created.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be created.
pub fn scaffold_project(directory: &Path) -> Result<Vec<PathBuf>> {
    info!("Initializing Elastiform project in: {}", directory.display());
    let mut created = Vec::new();

    for kind in ResourceKind::ALL {
        let dir = directory.join(kind.directory_name());
        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
            created.push(dir);
        }
    }

    let files = [
        (directory.join("clusters.yaml"), CLUSTERS_TEMPLATE),
        (
            directory
                .join(ResourceKind::IndexTemplate.directory_name())
                .join("example-logs.json"),
            EXAMPLE_INDEX_TEMPLATE,
        ),
        (directory.join(".gitignore"), GITIGNORE_TEMPLATE),
    ];

    for (path, content) in files {
        if path.exists() {
            debug!("Keeping existing {}", path.display());
            continue;
        }
        fs::write(&path, content)?;
        created.push(path);
    }

    Ok(created)
}
