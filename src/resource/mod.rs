//! Resource kinds and their handlers.
//!
//! A resource is identified by its kind and name. Each kind has a handler
//! that knows how to fetch the live body from the cluster, how to write a
//! desired body, and how to normalize either side for comparison.

mod descriptor;
mod handler;
mod index;
mod ingest_pipeline;
mod kind;
mod lifecycle_policy;
mod registry;
mod templates;

pub use descriptor::{validate_name, ResourceDescriptor};
pub use handler::{strip_fields, ResourceHandler};
pub use index::IndexHandler;
pub use ingest_pipeline::IngestPipelineHandler;
pub use kind::ResourceKind;
pub use lifecycle_policy::LifecyclePolicyHandler;
pub use registry::HandlerRegistry;
pub use templates::{ComponentTemplateHandler, IndexTemplateHandler};
