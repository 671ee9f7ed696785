//! Reconciler tying planning and apply together.
//!
//! This module owns the handlers for one cluster and maps the outcome of a
//! run to the process exit status callers rely on.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::cluster::Transport;
use crate::config::RunSettings;
use crate::error::Result;
use crate::planner::{ApplyReport, Plan, PlanExecutor, Planner, ResourceFilter};
use crate::resource::{HandlerRegistry, ResourceDescriptor};

/// Reconciler for one cluster.
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Handlers shared by planning and apply.
    registry: HandlerRegistry,
    /// Plan computation.
    planner: Planner,
}

/// Outcome of a command, as reported through the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to do, or everything applied.
    Clean,
    /// A plan found differences. Nothing was written.
    DriftDetected,
    /// Something could not be evaluated or applied.
    Failed,
}

impl Reconciler {
    /// Creates a reconciler over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, settings: &RunSettings) -> Self {
        let registry = HandlerRegistry::new(transport);
        let planner = Planner::new(registry.clone())
            .with_concurrency(settings.concurrency)
            .with_fetch_errors(settings.fetch_errors);
        Self { registry, planner }
    }

    /// Computes the plan for the selected descriptors.
    ///
    /// # Errors
    ///
    /// See [`Planner::plan`].
    pub async fn plan(
        &self,
        cluster: &str,
        descriptors: &[ResourceDescriptor],
        filter: &ResourceFilter,
    ) -> Result<Plan> {
        self.planner.plan(cluster, descriptors, filter).await
    }

    /// Applies a plan, stopping new writes once `shutdown` turns `true`.
    pub async fn apply(
        &self,
        plan: &Plan,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> ApplyReport {
        let executor = PlanExecutor::new(&self.registry);
        let executor = match shutdown {
            Some(rx) => executor.with_shutdown(rx),
            None => executor,
        };
        executor.execute(plan).await
    }
}

impl RunOutcome {
    /// Process exit code.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Failed => 1,
            Self::DriftDetected => 2,
        }
    }

    /// Outcome of a plan-only run.
    #[must_use]
    pub fn from_plan(plan: &Plan) -> Self {
        if plan.has_failures() {
            Self::Failed
        } else if plan.has_drift() {
            Self::DriftDetected
        } else {
            Self::Clean
        }
    }

    /// Outcome of an apply run.
    #[must_use]
    pub fn from_apply(plan: &Plan, report: &ApplyReport) -> Self {
        if plan.has_failures() || !report.success || report.interrupted {
            Self::Failed
        } else {
            info!("Cluster {} converged", plan.cluster());
            Self::Clean
        }
    }
}
