//! Concrete index handler.
//!
//! Indices are create-only. The cluster reports their settings in a
//! canonical shape that rarely matches what users write: every setting is
//! folded under `settings.index`, dotted keys become nested objects and
//! scalar values come back as strings. Normalization brings both sides to
//! that shape before comparing. The cluster also reports defaults nobody
//! declared (replica count, tier preference, dynamically added mappings),
//! so only the keys present in the local file take part in the comparison.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::cluster::Transport;
use crate::error::ClusterError;

use super::handler::{keyed_entry, strip_fields, ResourceHandler};
use super::kind::ResourceKind;

/// Top-level sections dropped when empty.
const OPTIONAL_SECTIONS: [&str; 2] = ["aliases", "mappings"];

/// Handler for concrete indices.
#[derive(Clone)]
pub struct IndexHandler {
    transport: Arc<dyn Transport>,
}

impl IndexHandler {
    /// Creates a handler over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ResourceHandler for IndexHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Index
    }

    async fn fetch(&self, name: &str) -> Result<Option<Value>, ClusterError> {
        debug!("Fetching index {name}");
        let response = self.transport.get(&self.kind().remote_path(name)).await?;
        Ok(response.and_then(|r| keyed_entry(r, name)))
    }

    async fn write(&self, name: &str, body: &Value) -> Result<(), ClusterError> {
        self.transport.put(&self.kind().remote_path(name), body).await
    }

    fn normalize(&self, body: &Value) -> Value {
        let mut normalized = body.clone();
        if let Some(object) = normalized.as_object_mut() {
            if let Some(settings) = object.remove("settings") {
                object.insert(String::from("settings"), canonical_settings(settings));
            }
            for section in OPTIONAL_SECTIONS {
                if object.get(section).is_some_and(is_empty_object) {
                    object.remove(section);
                }
            }
        }
        strip_fields(&normalized, self.kind().server_managed_fields())
    }

    fn comparable(&self, remote: Value, desired: &Value) -> Value {
        declared_subset(remote, desired)
    }
}

/// Keeps the parts of `remote` whose object keys also appear in `declared`.
/// Arrays and scalars are kept whole.
fn declared_subset(remote: Value, declared: &Value) -> Value {
    match (remote, declared) {
        (Value::Object(entries), Value::Object(shape)) => Value::Object(
            entries
                .into_iter()
                .filter_map(|(key, value)| {
                    let wanted = shape.get(&key)?;
                    Some((key, declared_subset(value, wanted)))
                })
                .collect(),
        ),
        (remote, _) => remote,
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// Folds every setting under `index`, expanding dotted keys and rendering
/// scalars as strings.
fn canonical_settings(settings: Value) -> Value {
    let Value::Object(entries) = settings else {
        return settings;
    };

    let mut index = Map::new();
    for (key, value) in entries {
        match (key.as_str(), value) {
            ("index", Value::Object(nested)) => {
                for (nested_key, nested_value) in nested {
                    insert_dotted(&mut index, &nested_key, nested_value);
                }
            }
            (_, value) => {
                let key = key.strip_prefix("index.").unwrap_or(&key);
                insert_dotted(&mut index, key, value);
            }
        }
    }

    let mut canonical = Map::new();
    canonical.insert(String::from("index"), Value::Object(index));
    Value::Object(canonical)
}

fn insert_dotted(target: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        Some((head, rest)) => {
            let child = target
                .entry(head)
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_dotted(child, rest, value);
            }
        }
        None => match stringify_scalars(value) {
            Value::Object(nested) => {
                let child = target
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !child.is_object() {
                    *child = Value::Object(Map::new());
                }
                if let Value::Object(child) = child {
                    for (nested_key, nested_value) in nested {
                        insert_dotted(child, &nested_key, nested_value);
                    }
                }
            }
            value => {
                target.insert(key.to_string(), value);
            }
        },
    }
}

fn stringify_scalars(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_scalars).collect()),
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k, stringify_scalars(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::MockTransport;
    use serde_json::json;

    fn handler() -> IndexHandler {
        IndexHandler::new(Arc::new(MockTransport::new()))
    }

    #[test]
    fn test_user_settings_match_cluster_shape() {
        let desired = json!({
            "settings": { "number_of_shards": 1, "index.refresh_interval": "5s" },
            "mappings": { "properties": { "ts": { "type": "date" } } }
        });
        let remote = json!({
            "aliases": {},
            "mappings": { "properties": { "ts": { "type": "date" } } },
            "settings": {
                "index": {
                    "number_of_shards": "1",
                    "refresh_interval": "5s",
                    "uuid": "Zx1",
                    "creation_date": "1700000000000",
                    "provided_name": "events-000001",
                    "version": { "created": "8110099" }
                }
            }
        });
        let h = handler();
        assert_eq!(h.normalize(&desired), h.normalize(&remote));
    }

    #[test]
    fn test_dotted_keys_expand() {
        let desired = json!({
            "settings": { "index": { "mapping.total_fields.limit": 2000 } }
        });
        assert_eq!(
            handler().normalize(&desired),
            json!({
                "settings": { "index": { "mapping": { "total_fields": { "limit": "2000" } } } }
            })
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            json!({}),
            json!({ "settings": { "number_of_replicas": 0, "index": { "codec": "best_compression" } } }),
            json!({ "settings": { "analysis": { "analyzer": { "a": { "type": "custom", "filter": ["lowercase"] } } } } }),
            json!({ "aliases": { "current": {} }, "mappings": {} }),
            json!({ "settings": "weird" }),
        ];
        let h = handler();
        for sample in samples {
            let once = h.normalize(&sample);
            assert_eq!(h.normalize(&once), once, "not idempotent for {sample}");
        }
    }

    #[test]
    fn test_non_empty_aliases_are_kept() {
        let normalized = handler().normalize(&json!({ "aliases": { "current": {} } }));
        assert_eq!(normalized, json!({ "aliases": { "current": {} } }));
    }

    fn reported_by_cluster() -> Value {
        json!({
            "aliases": {},
            "mappings": {
                "properties": {
                    "ts": { "type": "date" },
                    "host": { "type": "keyword" }
                }
            },
            "settings": {
                "index": {
                    "number_of_shards": "1",
                    "number_of_replicas": "1",
                    "routing": {
                        "allocation": { "include": { "_tier_preference": "data_content" } }
                    },
                    "uuid": "Zx1",
                    "creation_date": "1700000000000",
                    "provided_name": "events-000001",
                    "version": { "created": "8110099" }
                }
            }
        })
    }

    #[test]
    fn test_undeclared_cluster_defaults_are_ignored() {
        let desired = json!({
            "settings": { "number_of_shards": 1 },
            "mappings": { "properties": { "ts": { "type": "date" } } }
        });
        let h = handler();
        let desired = h.normalize(&desired);
        let current = h.comparable(h.normalize(&reported_by_cluster()), &desired);
        assert_eq!(current, desired);
    }

    #[test]
    fn test_declared_setting_still_compared() {
        let desired = handler().normalize(&json!({ "settings": { "number_of_shards": 3 } }));
        let current = handler().comparable(handler().normalize(&reported_by_cluster()), &desired);
        assert_eq!(
            current,
            json!({ "settings": { "index": { "number_of_shards": "1" } } })
        );
    }

    #[test]
    fn test_declared_key_missing_remotely_stays_missing() {
        let desired = handler().normalize(&json!({ "aliases": { "events": {} } }));
        let current = handler().comparable(handler().normalize(&reported_by_cluster()), &desired);
        assert_eq!(current, json!({}));
    }

    #[test]
    fn test_index_is_immutable() {
        assert!(!handler().is_mutable());
    }

    #[tokio::test]
    async fn test_fetch_index() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|path| path == "events-000001")
            .returning(|_| Ok(Some(json!({ "events-000001": { "settings": {} } }))));

        let h = IndexHandler::new(Arc::new(transport));
        assert_eq!(
            h.fetch("events-000001").await.expect("fetch"),
            Some(json!({ "settings": {} }))
        );
    }
}
