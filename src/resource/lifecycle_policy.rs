//! Index lifecycle management policy handler.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::cluster::Transport;
use crate::error::ClusterError;

use super::handler::{keyed_entry, strip_fields, ResourceHandler};
use super::kind::ResourceKind;

/// `min_age` the cluster reports for a phase that declares none.
const DEFAULT_MIN_AGE: &str = "0ms";

/// Handler for ILM policies.
///
/// The cluster reports a policy as
/// `{"<name>": {"version": n, "modified_date": ..., "policy": {...}}}`; the
/// bookkeeping fields around `policy` are stripped during normalization, and
/// so is a phase `min_age` equal to the default.
#[derive(Clone)]
pub struct LifecyclePolicyHandler {
    transport: Arc<dyn Transport>,
}

impl LifecyclePolicyHandler {
    /// Creates a handler over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ResourceHandler for LifecyclePolicyHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::LifecyclePolicy
    }

    async fn fetch(&self, name: &str) -> Result<Option<Value>, ClusterError> {
        debug!("Fetching lifecycle policy {name}");
        let response = self.transport.get(&self.kind().remote_path(name)).await?;
        Ok(response.and_then(|r| keyed_entry(r, name)))
    }

    async fn write(&self, name: &str, body: &Value) -> Result<(), ClusterError> {
        self.transport.put(&self.kind().remote_path(name), body).await
    }

    fn normalize(&self, body: &Value) -> Value {
        let mut normalized = strip_fields(body, self.kind().server_managed_fields());
        if let Some(phases) = normalized
            .pointer_mut("/policy/phases")
            .and_then(Value::as_object_mut)
        {
            for phase in phases.values_mut().filter_map(Value::as_object_mut) {
                if phase.get("min_age").and_then(Value::as_str) == Some(DEFAULT_MIN_AGE) {
                    phase.remove("min_age");
                }
            }
        }
        normalized
    }
}
