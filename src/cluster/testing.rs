//! Test doubles for [`Transport`].
//!
//! `MockTransport` is for strict call expectations. `FakeCluster` keeps
//! state between calls and answers with the same envelopes and
//! server-managed fields a real cluster adds.

use async_trait::async_trait;
use mockall::mock;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ClusterError;

use super::transport::Transport;

mock! {
    pub Transport {}

    #[async_trait]
    impl Transport for Transport {
        async fn get(&self, path: &str) -> Result<Option<Value>, ClusterError>;
        async fn put(&self, path: &str, body: &Value) -> Result<(), ClusterError>;
    }
}

/// In-memory cluster keyed by remote path.
#[derive(Debug, Default)]
pub struct FakeCluster {
    stored: Mutex<BTreeMap<String, Value>>,
    failing: Mutex<BTreeSet<String>>,
    delays: Mutex<BTreeMap<String, Duration>>,
    puts: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `body` at `path` as if it had been written through the API.
    pub fn seed(&self, path: &str, body: Value) {
        let stored = with_server_fields(path, body);
        self.stored
            .lock()
            .expect("fake cluster lock")
            .insert(path.to_string(), stored);
    }

    /// Makes every request to `path` fail with a server error.
    pub fn fail(&self, path: &str) {
        self.failing
            .lock()
            .expect("fake cluster lock")
            .insert(path.to_string());
    }

    /// Delays GET answers for `path`.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.delays
            .lock()
            .expect("fake cluster lock")
            .insert(path.to_string(), delay);
    }

    /// Paths written so far, in order.
    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().expect("fake cluster lock").clone()
    }

    fn check(&self, path: &str) -> Result<(), ClusterError> {
        if self.failing.lock().expect("fake cluster lock").contains(path) {
            return Err(ClusterError::api_error(500, format!("simulated failure for {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for FakeCluster {
    async fn get(&self, path: &str) -> Result<Option<Value>, ClusterError> {
        let delay = self
            .delays
            .lock()
            .expect("fake cluster lock")
            .get(path)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(path)?;

        let stored = self
            .stored
            .lock()
            .expect("fake cluster lock")
            .get(path)
            .cloned();
        Ok(stored.map(|body| envelope(path, body)))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<(), ClusterError> {
        self.check(path)?;
        self.puts
            .lock()
            .expect("fake cluster lock")
            .push(path.to_string());
        self.seed(path, body.clone());
        Ok(())
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn envelope(path: &str, body: Value) -> Value {
    let name = name_of(path);
    if path.starts_with("_index_template/") {
        json!({ "index_templates": [{ "name": name, "index_template": body }] })
    } else if path.starts_with("_component_template/") {
        json!({ "component_templates": [{ "name": name, "component_template": body }] })
    } else {
        json!({ name: body })
    }
}

/// Adds what a cluster reports on top of the written body.
fn with_server_fields(path: &str, body: Value) -> Value {
    if path.starts_with("_ilm/policy/") {
        let mut stored = body;
        if let Some(object) = stored.as_object_mut() {
            object.insert(String::from("version"), json!(1));
            object.insert(String::from("modified_date"), json!("2024-05-01T10:00:00.000Z"));
            object.insert(
                String::from("in_use_by"),
                json!({ "indices": [], "data_streams": [], "composable_templates": [] }),
            );
        }
        if let Some(phases) = stored
            .pointer_mut("/policy/phases")
            .and_then(Value::as_object_mut)
        {
            for phase in phases.values_mut().filter_map(Value::as_object_mut) {
                phase
                    .entry("min_age")
                    .or_insert_with(|| json!("0ms"));
            }
        }
        stored
    } else if path.starts_with("_index_template/") {
        let mut stored = body;
        if let Some(object) = stored.as_object_mut() {
            object
                .entry("composed_of")
                .or_insert_with(|| json!([]));
        }
        stored
    } else if !path.contains('/') && !path.starts_with('_') {
        index_as_reported(name_of(path), body)
    } else {
        body
    }
}

fn index_as_reported(name: &str, body: Value) -> Value {
    let mut index = Map::new();
    if let Some(settings) = body.get("settings").and_then(Value::as_object) {
        for (key, value) in settings {
            let key = key.strip_prefix("index.").unwrap_or(key);
            let value = match value {
                Value::Number(n) => Value::String(n.to_string()),
                Value::Bool(b) => Value::String(b.to_string()),
                other => other.clone(),
            };
            index.insert(key.to_string(), value);
        }
    }
    index
        .entry("number_of_replicas")
        .or_insert_with(|| json!("1"));
    index.entry("routing").or_insert_with(|| {
        json!({ "allocation": { "include": { "_tier_preference": "data_content" } } })
    });
    index.insert(String::from("uuid"), json!("fake-uuid"));
    index.insert(String::from("creation_date"), json!("1714557600000"));
    index.insert(String::from("provided_name"), json!(name));
    index.insert(String::from("version"), json!({ "created": "8130099" }));

    json!({
        "aliases": body.get("aliases").cloned().unwrap_or_else(|| json!({})),
        "mappings": body.get("mappings").cloned().unwrap_or_else(|| json!({})),
        "settings": { "index": index },
    })
}
