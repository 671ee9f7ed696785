//! Planning module for reconciliation runs.
//!
//! This module compares local descriptors with the cluster, producing a
//! reviewable plan, and applies that plan.

mod diff;
mod engine;
mod executor;
mod filter;
mod plan;

pub use diff::{diff, structurally_equal, ChangeKind, FieldChange, FieldPath, PathSegment};
pub use engine::{classify, FetchErrorPolicy, Planner};
pub use executor::{ApplyReport, ItemOutcome, ItemResult, PlanExecutor, INTERRUPTED_NOTE};
pub use filter::ResourceFilter;
pub use plan::{FetchFailure, Plan, PlanAction, PlanItem, PlanSummary};
