//! Plan executor.
//!
//! Writes are issued one at a time in plan order. A failed write is
//! recorded and the run moves on; nothing is rolled back.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::PlanError;
use crate::resource::{HandlerRegistry, ResourceKind};

use super::plan::{Plan, PlanAction, PlanItem};

/// Note attached to items skipped after a shutdown request.
pub const INTERRUPTED_NOTE: &str = "interrupted";

/// Executor for plans.
#[derive(Debug)]
pub struct PlanExecutor<'a> {
    /// Handlers used for writing.
    registry: &'a HandlerRegistry,
    /// Flips to `true` when the run should stop issuing writes.
    shutdown: Option<watch::Receiver<bool>>,
}

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The write was accepted by the cluster.
    Applied,
    /// No write was attempted.
    Skipped,
    /// The write was attempted and failed.
    Failed,
}

/// Result of one plan item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Planned action.
    pub action: PlanAction,
    /// Outcome.
    pub outcome: ItemOutcome,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why the item was skipped, when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of executing a whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Per-item results in plan order.
    pub results: Vec<ItemResult>,
    /// Number of applied items.
    pub applied: usize,
    /// Number of skipped items.
    pub skipped: usize,
    /// Number of failed items.
    pub failed: usize,
    /// True if no item failed.
    pub success: bool,
    /// True if a shutdown request stopped the run early.
    pub interrupted: bool,
}

impl<'a> PlanExecutor<'a> {
    /// Creates a new plan executor.
    #[must_use]
    pub const fn new(registry: &'a HandlerRegistry) -> Self {
        Self {
            registry,
            shutdown: None,
        }
    }

    /// Stops issuing writes once `shutdown` turns `true`.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Executes a plan.
    ///
    /// Only `Create` and `Update` items are written. The in-flight write
    /// always completes before a shutdown request is honoured.
    pub async fn execute(&self, plan: &Plan) -> ApplyReport {
        info!(
            "Applying {} change(s) to cluster {}",
            plan.writes().count(),
            plan.cluster()
        );

        let mut results = Vec::with_capacity(plan.items().len());
        let mut interrupted = false;

        for item in plan.items() {
            let result = match item.action {
                PlanAction::NoChange => ItemResult::skipped(item, None),
                PlanAction::Blocked => {
                    warn!("Skipping {}: {}", item.label(), item.note.as_deref().unwrap_or("blocked"));
                    ItemResult::skipped(item, item.note.clone())
                }
                PlanAction::Create | PlanAction::Update => {
                    if !interrupted && self.shutdown_requested() {
                        warn!("Shutdown requested, no further writes will be issued");
                        interrupted = true;
                    }
                    if interrupted {
                        ItemResult::skipped(item, Some(INTERRUPTED_NOTE.to_string()))
                    } else {
                        self.apply_item(item).await
                    }
                }
            };
            results.push(result);
        }

        let report = ApplyReport::new(results, interrupted);
        info!(
            "Apply finished: {} applied, {} failed, {} skipped",
            report.applied, report.failed, report.skipped
        );
        report
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    async fn apply_item(&self, item: &PlanItem) -> ItemResult {
        let handler = self.registry.handler(item.kind);

        if item.action == PlanAction::Update && !handler.is_mutable() {
            let violation = PlanError::PolicyViolation {
                kind: item.kind,
                name: item.name.clone(),
            };
            error!("Invariant breach: {violation}");
            return ItemResult::failed(item, violation.to_string());
        }

        match handler.write(&item.name, &item.desired).await {
            Ok(()) => {
                info!("{} {}", past_tense(item.action), item.label());
                ItemResult::applied(item)
            }
            Err(e) => {
                error!("Failed to {} {}: {e}", item.action, item.label());
                ItemResult::failed(item, e.to_string())
            }
        }
    }
}

const fn past_tense(action: PlanAction) -> &'static str {
    match action {
        PlanAction::Create => "Created",
        PlanAction::Update => "Updated",
        PlanAction::NoChange | PlanAction::Blocked => "Skipped",
    }
}

impl ItemResult {
    fn new(item: &PlanItem, outcome: ItemOutcome) -> Self {
        Self {
            kind: item.kind,
            name: item.name.clone(),
            action: item.action,
            outcome,
            error: None,
            note: None,
        }
    }

    fn applied(item: &PlanItem) -> Self {
        Self::new(item, ItemOutcome::Applied)
    }

    fn skipped(item: &PlanItem, note: Option<String>) -> Self {
        Self {
            note,
            ..Self::new(item, ItemOutcome::Skipped)
        }
    }

    fn failed(item: &PlanItem, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(item, ItemOutcome::Failed)
        }
    }

    /// `kind/name` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl ApplyReport {
    fn new(results: Vec<ItemResult>, interrupted: bool) -> Self {
        let count = |outcome: ItemOutcome| results.iter().filter(|r| r.outcome == outcome).count();
        let applied = count(ItemOutcome::Applied);
        let skipped = count(ItemOutcome::Skipped);
        let failed = count(ItemOutcome::Failed);

        Self {
            applied,
            skipped,
            failed,
            success: failed == 0,
            interrupted,
            results,
        }
    }
}
