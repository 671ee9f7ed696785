//! Resource kinds and their static metadata.
//!
//! Everything that differs between kinds but is not behavior lives here as
//! data: identifiers, remote paths, on-disk directories, mutability and the
//! list of server-managed fields excluded from comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of cluster resource kinds managed by Elastiform.
///
/// Variants are declared in alphabetical order of their identifiers so the
/// derived ordering matches the lexicographic order used for plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Component template (`_component_template`).
    ComponentTemplate,
    /// Concrete index. Create-only.
    Index,
    /// Composable index template (`_index_template`).
    IndexTemplate,
    /// Ingest pipeline (`_ingest/pipeline`).
    IngestPipeline,
    /// Index lifecycle management policy (`_ilm/policy`).
    LifecyclePolicy,
}

const VERSION: &[&str] = &["version"];

const TEMPLATE_MANAGED: &[&[&str]] = &[VERSION];

const PIPELINE_MANAGED: &[&[&str]] = &[VERSION];

const POLICY_MANAGED: &[&[&str]] = &[
    VERSION,
    &["modified_date"],
    &["modified_date_millis"],
    &["in_use_by"],
];

const INDEX_MANAGED: &[&[&str]] = &[
    &["settings", "index", "creation_date"],
    &["settings", "index", "uuid"],
    &["settings", "index", "version"],
    &["settings", "index", "provided_name"],
    &["settings", "index", "routing_num_shards"],
    &["settings", "index", "routing_partition_size"],
    &["settings", "index", "shard"],
    &["settings", "index", "store"],
];

impl ResourceKind {
    /// Every kind, in plan order.
    pub const ALL: [Self; 5] = [
        Self::ComponentTemplate,
        Self::Index,
        Self::IndexTemplate,
        Self::IngestPipeline,
        Self::LifecyclePolicy,
    ];

    /// Stable identifier used on the command line and in JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComponentTemplate => "component_template",
            Self::Index => "index",
            Self::IndexTemplate => "index_template",
            Self::IngestPipeline => "ingest_pipeline",
            Self::LifecyclePolicy => "lifecycle_policy",
        }
    }

    /// Directory under the resource root holding this kind's JSON files.
    #[must_use]
    pub const fn directory_name(self) -> &'static str {
        match self {
            Self::ComponentTemplate => "component_templates",
            Self::Index => "indices",
            Self::IndexTemplate => "index_templates",
            Self::IngestPipeline => "ingest_pipelines",
            Self::LifecyclePolicy => "ilm_policies",
        }
    }

    /// Remote collection the named resources live under. Indices live at
    /// the root of the cluster.
    #[must_use]
    pub const fn collection_path(self) -> Option<&'static str> {
        match self {
            Self::ComponentTemplate => Some("_component_template"),
            Self::Index => None,
            Self::IndexTemplate => Some("_index_template"),
            Self::IngestPipeline => Some("_ingest/pipeline"),
            Self::LifecyclePolicy => Some("_ilm/policy"),
        }
    }

    /// Remote path of a single named resource, relative to the cluster URL.
    #[must_use]
    pub fn remote_path(self, name: &str) -> String {
        match self.collection_path() {
            Some(collection) => format!("{collection}/{name}"),
            None => name.to_string(),
        }
    }

    /// Whether an existing resource of this kind may be overwritten.
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        !matches!(self, Self::Index)
    }

    /// Field paths the cluster manages on its own. They never take part in
    /// a comparison.
    #[must_use]
    pub const fn server_managed_fields(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::ComponentTemplate | Self::IndexTemplate => TEMPLATE_MANAGED,
            Self::IngestPipeline => PIPELINE_MANAGED,
            Self::LifecyclePolicy => POLICY_MANAGED,
            Self::Index => INDEX_MANAGED,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    /// Accepts both the identifier (`ingest_pipeline`) and the directory
    /// name (`ingest_pipelines`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.directory_name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown resource type '{s}' (expected one of: {})", valid.join(", "))
            })
    }
}
