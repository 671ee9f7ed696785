//! Ingest pipeline handler.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::cluster::Transport;
use crate::error::ClusterError;

use super::handler::{keyed_entry, ResourceHandler};
use super::kind::ResourceKind;

/// Handler for ingest pipelines.
#[derive(Clone)]
pub struct IngestPipelineHandler {
    transport: Arc<dyn Transport>,
}

impl IngestPipelineHandler {
    /// Creates a handler over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ResourceHandler for IngestPipelineHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IngestPipeline
    }

    async fn fetch(&self, name: &str) -> Result<Option<Value>, ClusterError> {
        debug!("Fetching ingest pipeline {name}");
        let response = self.transport.get(&self.kind().remote_path(name)).await?;
        Ok(response.and_then(|r| keyed_entry(r, name)))
    }

    async fn write(&self, name: &str, body: &Value) -> Result<(), ClusterError> {
        self.transport.put(&self.kind().remote_path(name), body).await
    }
}
