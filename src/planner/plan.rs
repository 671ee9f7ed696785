//! Plan types.
//!
//! A plan is the reviewable outcome of comparing local descriptors with the
//! cluster. Its serialized form is the machine-readable contract of the
//! `plan` command.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::resource::ResourceKind;

use super::diff::FieldChange;

/// What the apply step will do with one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// The resource does not exist and will be created.
    Create,
    /// The resource exists, differs, and will be overwritten.
    Update,
    /// The resource matches.
    NoChange,
    /// The resource differs but its kind cannot be updated in place.
    Blocked,
}

/// Plan entry for one resource.
#[derive(Debug, Clone, Serialize)]
pub struct PlanItem {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Planned action.
    pub action: PlanAction,
    /// Normalized differences, ordered by path. Empty for `NoChange`.
    pub changes: Vec<FieldChange>,
    /// Explanation for the user. Always set for `Blocked`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// The body to write, exactly as described locally.
    #[serde(skip)]
    pub desired: Value,
}

/// Count of items per action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Resources to create.
    pub create: usize,
    /// Resources to update.
    pub update: usize,
    /// Resources already in sync.
    pub no_change: usize,
    /// Resources that differ but cannot be changed.
    pub blocked: usize,
}

/// A resource whose current state could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Error reported by the transport.
    pub error: String,
}

/// The ordered, deterministic result of planning against one cluster.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    cluster: String,
    generated_at: DateTime<Utc>,
    fingerprint: String,
    summary: PlanSummary,
    items: Vec<PlanItem>,
    failures: Vec<FetchFailure>,
}

impl PlanAction {
    /// Whether the executor issues a write for this action.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }

    /// Stable identifier, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::NoChange => "no_change",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PlanItem {
    /// `kind/name` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl fmt::Display for PlanItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.action, self.kind, self.name)?;
        if !self.changes.is_empty() {
            write!(f, " ({} change(s))", self.changes.len())?;
        }
        Ok(())
    }
}

impl PlanSummary {
    fn tally(items: &[PlanItem]) -> Self {
        items.iter().fold(Self::default(), |mut summary, item| {
            match item.action {
                PlanAction::Create => summary.create += 1,
                PlanAction::Update => summary.update += 1,
                PlanAction::NoChange => summary.no_change += 1,
                PlanAction::Blocked => summary.blocked += 1,
            }
            summary
        })
    }

    /// Total number of items.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.create + self.update + self.no_change + self.blocked
    }
}

impl Plan {
    /// Builds a plan, ordering items and failures by `(kind, name)`.
    #[must_use]
    pub fn new(
        cluster: impl Into<String>,
        mut items: Vec<PlanItem>,
        mut failures: Vec<FetchFailure>,
    ) -> Self {
        items.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        failures.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));

        Self {
            cluster: cluster.into(),
            generated_at: Utc::now(),
            fingerprint: fingerprint(&items),
            summary: PlanSummary::tally(&items),
            items,
            failures,
        }
    }

    /// Cluster the plan was computed against.
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// When the plan was computed.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// SHA-256 over the planned items. Equal for plans with the same
    /// actions and changes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Items ordered by `(kind, name)`.
    #[must_use]
    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    /// Resources left out of the plan because their state was unavailable.
    #[must_use]
    pub fn failures(&self) -> &[FetchFailure] {
        &self.failures
    }

    /// Count of items per action.
    #[must_use]
    pub const fn summary(&self) -> PlanSummary {
        self.summary
    }

    /// Items the executor will write.
    pub fn writes(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.iter().filter(|item| item.action.is_write())
    }

    /// True if applying the plan issues at least one write.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.summary.create + self.summary.update > 0
    }

    /// True if any resource differs from the cluster, including blocked ones.
    #[must_use]
    pub const fn has_drift(&self) -> bool {
        self.has_changes() || self.summary.blocked > 0
    }

    /// True if some resources could not be planned.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// True if the plan holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        write!(
            f,
            "Plan for {}: {} to create, {} to update, {} blocked, {} unchanged",
            self.cluster, s.create, s.update, s.blocked, s.no_change
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} failed to fetch", self.failures.len())?;
        }
        Ok(())
    }
}

fn fingerprint(items: &[PlanItem]) -> String {
    let mut hasher = Sha256::new();
    for item in items {
        hasher.update(serde_json::to_vec(item).unwrap_or_default());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
