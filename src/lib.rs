// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Elastiform
//!
//! Declarative, reviewable reconciliation of Elasticsearch resources.
//!
//! ## Overview
//!
//! Elastiform keeps index templates, component templates, lifecycle
//! policies, ingest pipelines and indices described as JSON files in sync
//! with one or more clusters:
//!
//! - Describe each resource as a file under its kind directory
//! - Review a deterministic plan of what would change, field by field
//! - Apply the plan, writing only resources that differ
//!
//! Nothing is ever deleted, and indices that differ are reported as
//! blocked instead of being rewritten.
//!
//! ## Architecture
//!
//! 1. **Desired state**: resource files found by the [`loader`]
//! 2. **Current state**: fetched through [`resource`] handlers over a
//!    [`cluster`] transport
//! 3. **Plan**: normalized diffs computed by the [`planner`]
//! 4. **Apply**: sequential, fail-soft writes driven by the [`reconciler`]
//!
//! ## Modules
//!
//! - [`config`]: Cluster configuration parsing and validation
//! - [`cluster`]: HTTP transport to the cluster REST API
//! - [`resource`]: Resource kinds, descriptors and per-kind handlers
//! - [`loader`]: Resource file discovery
//! - [`planner`]: Diffing, planning and plan execution
//! - [`reconciler`]: Plan/apply orchestration and exit status
//! - [`scaffold`]: Starter project layout
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! settings:
//!   concurrency: 8
//!
//! clusters:
//!   local:
//!     url: http://localhost:9200
//!     auth:
//!       type: basic
//!       username: elastic
//!       password: ${ES_PASSWORD}
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod loader;
pub mod planner;
pub mod reconciler;
pub mod resource;
pub mod scaffold;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use cluster::{ClusterClient, Transport};
pub use config::{ConfigParser, ConfigValidator, ElastiformConfig};
pub use error::{ElastiformError, Result};
pub use loader::ResourceLoader;
pub use planner::{ApplyReport, Plan, PlanExecutor, Planner, ResourceFilter};
pub use reconciler::{Reconciler, RunOutcome};
pub use resource::{HandlerRegistry, ResourceDescriptor, ResourceHandler, ResourceKind};
