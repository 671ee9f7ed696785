//! Lookup from resource kind to its handler.

use std::fmt;
use std::sync::Arc;

use crate::cluster::Transport;

use super::handler::ResourceHandler;
use super::index::IndexHandler;
use super::ingest_pipeline::IngestPipelineHandler;
use super::kind::ResourceKind;
use super::lifecycle_policy::LifecyclePolicyHandler;
use super::templates::{ComponentTemplateHandler, IndexTemplateHandler};

/// One handler per kind, all sharing a single transport.
#[derive(Clone)]
pub struct HandlerRegistry {
    component_template: Arc<dyn ResourceHandler>,
    index: Arc<dyn ResourceHandler>,
    index_template: Arc<dyn ResourceHandler>,
    ingest_pipeline: Arc<dyn ResourceHandler>,
    lifecycle_policy: Arc<dyn ResourceHandler>,
}

impl HandlerRegistry {
    /// Builds the registry with the built-in handler for every kind.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            component_template: Arc::new(ComponentTemplateHandler::new(Arc::clone(&transport))),
            index: Arc::new(IndexHandler::new(Arc::clone(&transport))),
            index_template: Arc::new(IndexTemplateHandler::new(Arc::clone(&transport))),
            ingest_pipeline: Arc::new(IngestPipelineHandler::new(Arc::clone(&transport))),
            lifecycle_policy: Arc::new(LifecyclePolicyHandler::new(transport)),
        }
    }

    /// Returns the handler for `kind`.
    #[must_use]
    pub fn handler(&self, kind: ResourceKind) -> Arc<dyn ResourceHandler> {
        let handler = match kind {
            ResourceKind::ComponentTemplate => &self.component_template,
            ResourceKind::Index => &self.index,
            ResourceKind::IndexTemplate => &self.index_template,
            ResourceKind::IngestPipeline => &self.ingest_pipeline,
            ResourceKind::LifecyclePolicy => &self.lifecycle_policy,
        };
        Arc::clone(handler)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &ResourceKind::ALL)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::MockTransport;

    #[test]
    fn test_every_kind_has_its_handler() {
        let registry = HandlerRegistry::new(Arc::new(MockTransport::new()));
        for kind in ResourceKind::ALL {
            assert_eq!(registry.handler(kind).kind(), kind);
        }
    }
}
