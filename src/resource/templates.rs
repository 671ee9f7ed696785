//! Index template and component template handlers.
//!
//! Both kinds come back from the cluster wrapped in a named list:
//! `{"index_templates": [{"name": ..., "index_template": {...}}]}`.
//! Index templates are reported with `composed_of: []` even when no
//! component template was declared.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::cluster::Transport;
use crate::error::ClusterError;

use super::handler::{listed_entry, strip_fields, ResourceHandler};
use super::kind::ResourceKind;

/// Handler for composable index templates.
#[derive(Clone)]
pub struct IndexTemplateHandler {
    transport: Arc<dyn Transport>,
}

impl IndexTemplateHandler {
    /// Creates a handler over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ResourceHandler for IndexTemplateHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IndexTemplate
    }

    async fn fetch(&self, name: &str) -> Result<Option<Value>, ClusterError> {
        debug!("Fetching index template {name}");
        let response = self.transport.get(&self.kind().remote_path(name)).await?;
        Ok(response.and_then(|r| listed_entry(r, "index_templates", "index_template", name)))
    }

    async fn write(&self, name: &str, body: &Value) -> Result<(), ClusterError> {
        self.transport.put(&self.kind().remote_path(name), body).await
    }

    fn normalize(&self, body: &Value) -> Value {
        let mut normalized = strip_fields(body, self.kind().server_managed_fields());
        if let Some(object) = normalized.as_object_mut() {
            let no_components = object
                .get("composed_of")
                .and_then(Value::as_array)
                .is_some_and(Vec::is_empty);
            if no_components {
                object.remove("composed_of");
            }
        }
        normalized
    }
}

/// Handler for component templates.
#[derive(Clone)]
pub struct ComponentTemplateHandler {
    transport: Arc<dyn Transport>,
}

impl ComponentTemplateHandler {
    /// Creates a handler over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ResourceHandler for ComponentTemplateHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ComponentTemplate
    }

    async fn fetch(&self, name: &str) -> Result<Option<Value>, ClusterError> {
        debug!("Fetching component template {name}");
        let response = self.transport.get(&self.kind().remote_path(name)).await?;
        Ok(response
            .and_then(|r| listed_entry(r, "component_templates", "component_template", name)))
    }

    async fn write(&self, name: &str, body: &Value) -> Result<(), ClusterError> {
        self.transport.put(&self.kind().remote_path(name), body).await
    }
}
