//! The seam between resource handlers and the cluster REST API.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClusterError;

/// Minimal JSON transport to a cluster.
///
/// Paths are relative to the cluster base URL, e.g. `_ilm/policy/hot-warm`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET. A 404 answer is `Ok(None)`.
    async fn get(&self, path: &str) -> Result<Option<Value>, ClusterError>;

    /// Issues a PUT with a JSON body.
    async fn put(&self, path: &str, body: &Value) -> Result<(), ClusterError>;
}
