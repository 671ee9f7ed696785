//! The per-kind handler capability set.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClusterError;

use super::kind::ResourceKind;

/// Capabilities every resource kind provides to the planner and executor.
///
/// `fetch` answers `Ok(None)` for a resource that does not exist; only
/// genuine transport or server failures are errors.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Kind served by this handler.
    fn kind(&self) -> ResourceKind;

    /// Fetches the current remote body, unwrapped from the response envelope.
    async fn fetch(&self, name: &str) -> Result<Option<Value>, ClusterError>;

    /// Writes the desired body to the cluster.
    async fn write(&self, name: &str, body: &Value) -> Result<(), ClusterError>;

    /// Returns a copy of `body` in comparable form.
    ///
    /// Must be idempotent: normalizing twice yields the same value as
    /// normalizing once.
    fn normalize(&self, body: &Value) -> Value {
        strip_fields(body, self.kind().server_managed_fields())
    }

    /// Reduces a normalized remote body to the part compared with the
    /// normalized `desired` body. The whole body by default.
    fn comparable(&self, remote: Value, _desired: &Value) -> Value {
        remote
    }

    /// Whether an existing resource may be overwritten.
    fn is_mutable(&self) -> bool {
        self.kind().is_mutable()
    }
}

/// Returns a copy of `body` with every listed field path removed.
///
/// Paths that do not exist are ignored. Parents left empty are kept.
#[must_use]
pub fn strip_fields(body: &Value, paths: &[&[&str]]) -> Value {
    let mut stripped = body.clone();
    for path in paths {
        remove_path(&mut stripped, path);
    }
    stripped
}

fn remove_path(value: &mut Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = value;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(object) = current.as_object_mut() {
        object.remove(*last);
    }
}

/// Unwraps a `{ "<name>": body }` response.
pub(crate) fn keyed_entry(mut response: Value, name: &str) -> Option<Value> {
    response.as_object_mut()?.remove(name)
}

/// Unwraps a `{ "<list>": [{ "name": ..., "<item>": body }] }` response,
/// picking the entry whose name matches.
pub(crate) fn listed_entry(
    mut response: Value,
    list_key: &str,
    item_key: &str,
    name: &str,
) -> Option<Value> {
    let entries = response.get_mut(list_key)?.as_array_mut()?;
    let entry = entries
        .iter_mut()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))?;
    entry.as_object_mut()?.remove(item_key)
}
