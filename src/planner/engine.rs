//! Plan computation.
//!
//! The planner selects descriptors, fetches their current state with a
//! bounded number of requests in flight, and classifies each one. Fetches
//! may finish in any order; the resulting plan is always sorted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_CONCURRENCY;
use crate::error::{ClusterError, ElastiformError, PlanError, Result};
use crate::resource::{HandlerRegistry, ResourceDescriptor, ResourceHandler, ResourceKind};

use super::diff::diff;
use super::filter::ResourceFilter;
use super::plan::{FetchFailure, Plan, PlanAction, PlanItem};

/// What to do when the current state of a resource cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorPolicy {
    /// Record the failure in the plan and keep planning the rest.
    #[default]
    Isolate,
    /// Fail the whole plan on the first failure.
    Abort,
}

/// Computes plans against one cluster.
#[derive(Debug, Clone)]
pub struct Planner {
    registry: HandlerRegistry,
    concurrency: usize,
    fetch_errors: FetchErrorPolicy,
}

type Fetched = (ResourceDescriptor, std::result::Result<Option<Value>, ClusterError>);

impl Planner {
    /// Creates a planner with default concurrency that isolates fetch errors.
    #[must_use]
    pub const fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            concurrency: DEFAULT_CONCURRENCY,
            fetch_errors: FetchErrorPolicy::Isolate,
        }
    }

    /// Sets the maximum number of fetches in flight. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = if concurrency == 0 { 1 } else { concurrency };
        self
    }

    /// Sets the fetch error policy.
    #[must_use]
    pub fn with_fetch_errors(mut self, policy: FetchErrorPolicy) -> Self {
        self.fetch_errors = policy;
        self
    }

    /// Computes the plan for the descriptors selected by `filter`.
    ///
    /// Unselected descriptors cause no cluster traffic. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResource` if two descriptors share a kind and name,
    /// and `FetchFailed` if a fetch fails under [`FetchErrorPolicy::Abort`].
    pub async fn plan(
        &self,
        cluster: &str,
        descriptors: &[ResourceDescriptor],
        filter: &ResourceFilter,
    ) -> Result<Plan> {
        ensure_unique(descriptors)?;

        let selected: Vec<ResourceDescriptor> = descriptors
            .iter()
            .filter(|d| filter.selects(d))
            .cloned()
            .collect();
        info!(
            "Planning {} of {} resource(s) against cluster {cluster}",
            selected.len(),
            descriptors.len()
        );

        let mut fetched = self.fetch_all(selected).await?;
        fetched.sort_by(|(a, _), (b, _)| (a.kind(), a.name()).cmp(&(b.kind(), b.name())));

        let mut items = Vec::with_capacity(fetched.len());
        let mut failures = Vec::new();
        for (descriptor, outcome) in fetched {
            match outcome {
                Ok(remote) => {
                    let handler = self.registry.handler(descriptor.kind());
                    let item = classify(&descriptor, handler.as_ref(), remote.as_ref());
                    debug!("{descriptor}: {}", item.action);
                    items.push(item);
                }
                Err(source) if self.fetch_errors == FetchErrorPolicy::Abort => {
                    return Err(PlanError::FetchFailed {
                        kind: descriptor.kind(),
                        name: descriptor.name().to_string(),
                        source,
                    }
                    .into());
                }
                Err(source) => {
                    warn!("Could not fetch {descriptor}: {source}");
                    failures.push(FetchFailure {
                        kind: descriptor.kind(),
                        name: descriptor.name().to_string(),
                        error: source.to_string(),
                    });
                }
            }
        }

        let plan = Plan::new(cluster, items, failures);
        info!("{plan}");
        Ok(plan)
    }

    async fn fetch_all(&self, selected: Vec<ResourceDescriptor>) -> Result<Vec<Fetched>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for descriptor in selected {
            let handler = self.registry.handler(descriptor.kind());
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (descriptor, Err(ClusterError::network("fetch pool closed")));
                };
                let outcome = handler.fetch(descriptor.name()).await;
                (descriptor, outcome)
            });
        }

        let mut fetched = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let entry =
                joined.map_err(|e| ElastiformError::internal(format!("fetch task failed: {e}")))?;
            fetched.push(entry);
        }
        Ok(fetched)
    }
}

/// Classifies one descriptor against its current remote body.
///
/// Both sides are normalized before comparing. The item keeps the
/// descriptor body unmodified for writing.
#[must_use]
pub fn classify(
    descriptor: &ResourceDescriptor,
    handler: &dyn ResourceHandler,
    remote: Option<&Value>,
) -> PlanItem {
    let desired = handler.normalize(descriptor.body());

    let (action, changes, note) = match remote {
        None => (PlanAction::Create, diff(&Value::Object(Map::new()), &desired), None),
        Some(remote) => {
            let current = handler.comparable(handler.normalize(remote), &desired);
            let changes = diff(&current, &desired);
            if changes.is_empty() {
                (PlanAction::NoChange, changes, None)
            } else if handler.is_mutable() {
                (PlanAction::Update, changes, None)
            } else {
                let note = blocked_note(descriptor.kind(), changes.len());
                (PlanAction::Blocked, changes, Some(note))
            }
        }
    };

    PlanItem {
        kind: descriptor.kind(),
        name: descriptor.name().to_string(),
        action,
        changes,
        note,
        desired: descriptor.body().clone(),
    }
}

fn blocked_note(kind: ResourceKind, change_count: usize) -> String {
    format!(
        "{kind} cannot be updated in place; {change_count} change(s) will not be applied. \
         Recreate it or reindex into a new {kind} to converge"
    )
}

fn ensure_unique(descriptors: &[ResourceDescriptor]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for descriptor in descriptors {
        if !seen.insert((descriptor.kind(), descriptor.name())) {
            return Err(PlanError::DuplicateResource {
                kind: descriptor.kind(),
                name: descriptor.name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{FakeCluster, MockTransport};
    use crate::cluster::Transport;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn planner(transport: Arc<dyn Transport>) -> Planner {
        Planner::new(HandlerRegistry::new(transport))
    }

    fn policy(name: &str, delete_after: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(
            ResourceKind::LifecyclePolicy,
            name,
            json!({ "policy": { "phases": { "delete": { "min_age": delete_after, "actions": { "delete": {} } } } } }),
        )
    }

    #[tokio::test]
    async fn test_missing_resource_is_created() {
        let cluster = Arc::new(FakeCluster::new());
        let plan = planner(cluster)
            .plan("local", &[policy("p1", "30d")], &ResourceFilter::all())
            .await
            .expect("plan");

        let item = &plan.items()[0];
        assert_eq!(item.action, PlanAction::Create);
        assert!(!item.changes.is_empty());
        assert!(item.changes.iter().all(|c| c.before.is_none()));
        assert_eq!(plan.summary().create, 1);
    }

    #[tokio::test]
    async fn test_server_managed_fields_are_ignored() {
        let cluster = Arc::new(FakeCluster::new());
        let local = policy("p1", "30d");
        cluster.seed("_ilm/policy/p1", local.body().clone());

        let plan = planner(cluster)
            .plan("local", &[local], &ResourceFilter::all())
            .await
            .expect("plan");
        assert_eq!(plan.items()[0].action, PlanAction::NoChange);
        assert!(plan.items()[0].changes.is_empty());
        assert!(!plan.has_drift());
    }

    #[tokio::test]
    async fn test_changed_pipeline_is_updated() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.seed(
            "_ingest/pipeline/geoip",
            json!({ "description": "old", "processors": [], "version": 3 }),
        );
        let local = ResourceDescriptor::new(
            ResourceKind::IngestPipeline,
            "geoip",
            json!({ "description": "new", "processors": [] }),
        );

        let plan = planner(cluster)
            .plan("local", &[local], &ResourceFilter::all())
            .await
            .expect("plan");
        let item = &plan.items()[0];
        assert_eq!(item.action, PlanAction::Update);
        assert_eq!(item.changes.len(), 1);
        assert_eq!(item.changes[0].path.to_string(), "description");
        assert_eq!(item.desired, json!({ "description": "new", "processors": [] }));
    }

    #[tokio::test]
    async fn test_changed_index_is_blocked() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.seed("events", json!({ "settings": { "number_of_shards": 1 } }));
        let local = ResourceDescriptor::new(
            ResourceKind::Index,
            "events",
            json!({ "settings": { "number_of_shards": 2 } }),
        );

        let plan = planner(cluster)
            .plan("local", &[local], &ResourceFilter::all())
            .await
            .expect("plan");
        let item = &plan.items()[0];
        assert_eq!(item.action, PlanAction::Blocked);
        assert!(item.note.is_some());
        assert_eq!(item.changes[0].path.to_string(), "settings.index.number_of_shards");
        assert!(plan.has_drift());
        assert!(!plan.has_changes());
    }

    #[tokio::test]
    async fn test_unchanged_index_is_not_blocked() {
        let cluster = Arc::new(FakeCluster::new());
        let body = json!({
            "settings": { "number_of_shards": 1 },
            "mappings": { "properties": { "ts": { "type": "date" } } }
        });
        cluster.seed("events", body.clone());

        let plan = planner(cluster)
            .plan(
                "local",
                &[ResourceDescriptor::new(ResourceKind::Index, "events", body)],
                &ResourceFilter::all(),
            )
            .await
            .expect("plan");
        assert_eq!(plan.items()[0].action, PlanAction::NoChange);
    }

    #[tokio::test]
    async fn test_index_with_cluster_defaults_is_unchanged() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|path| path == "events-000001")
            .returning(|_| {
                Ok(Some(json!({
                    "events-000001": {
                        "aliases": {},
                        "mappings": {},
                        "settings": {
                            "index": {
                                "number_of_shards": "1",
                                "number_of_replicas": "1",
                                "routing": {
                                    "allocation": {
                                        "include": { "_tier_preference": "data_content" }
                                    }
                                },
                                "uuid": "q3Zb",
                                "creation_date": "1714557600000",
                                "provided_name": "events-000001",
                                "version": { "created": "8130099" }
                            }
                        }
                    }
                })))
            });
        transport.expect_put().times(0);

        let same = ResourceDescriptor::new(
            ResourceKind::Index,
            "events-000001",
            json!({ "settings": { "number_of_shards": 1 } }),
        );
        let resized = ResourceDescriptor::new(
            ResourceKind::Index,
            "events-000001",
            json!({ "settings": { "number_of_shards": 2 } }),
        );
        let planner = planner(Arc::new(transport));

        let plan = planner
            .plan("local", &[same], &ResourceFilter::all())
            .await
            .expect("plan");
        assert_eq!(plan.items()[0].action, PlanAction::NoChange);
        assert!(!plan.has_drift());

        let plan = planner
            .plan("local", &[resized], &ResourceFilter::all())
            .await
            .expect("plan");
        let item = &plan.items()[0];
        assert_eq!(item.action, PlanAction::Blocked);
        assert_eq!(item.changes.len(), 1);
        assert_eq!(item.changes[0].path.to_string(), "settings.index.number_of_shards");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.fail("_ilm/policy/broken");

        let plan = planner(cluster)
            .plan(
                "local",
                &[policy("broken", "1d"), policy("fine", "1d")],
                &ResourceFilter::all(),
            )
            .await
            .expect("plan");
        assert_eq!(plan.items().len(), 1);
        assert_eq!(plan.items()[0].name, "fine");
        assert_eq!(plan.failures().len(), 1);
        assert_eq!(plan.failures()[0].name, "broken");
        assert!(plan.failures()[0].error.contains("500"));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_when_configured() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.fail("_ilm/policy/broken");

        let err = planner(cluster)
            .with_fetch_errors(FetchErrorPolicy::Abort)
            .plan(
                "local",
                &[policy("broken", "1d"), policy("fine", "1d")],
                &ResourceFilter::all(),
            )
            .await
            .expect_err("abort");
        assert!(matches!(
            err,
            ElastiformError::Plan(PlanError::FetchFailed { ref name, .. }) if name == "broken"
        ));
    }

    #[tokio::test]
    async fn test_filter_prevents_remote_calls() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|path| path == "_ingest/pipeline/geoip")
            .times(1)
            .returning(|_| Ok(None));
        transport.expect_put().times(0);

        let descriptors = [
            ResourceDescriptor::new(ResourceKind::IngestPipeline, "geoip", json!({})),
            ResourceDescriptor::new(ResourceKind::IngestPipeline, "other", json!({})),
            policy("geoip", "1d"),
        ];
        let filter = ResourceFilter::all()
            .with_kinds([ResourceKind::IngestPipeline])
            .with_names(["geoip"]);

        let plan = planner(Arc::new(transport))
            .plan("local", &descriptors, &filter)
            .await
            .expect("plan");
        assert_eq!(plan.items().len(), 1);
        assert_eq!(plan.items()[0].label(), "ingest_pipeline/geoip");
    }

    #[tokio::test]
    async fn test_order_independent_of_completion() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.delay("_component_template/a", Duration::from_millis(60));
        cluster.delay("_ilm/policy/a", Duration::from_millis(30));

        let descriptors = [
            policy("b", "1d"),
            ResourceDescriptor::new(ResourceKind::IndexTemplate, "x", json!({})),
            policy("a", "1d"),
            ResourceDescriptor::new(ResourceKind::ComponentTemplate, "a", json!({})),
        ];
        let plan = planner(cluster)
            .plan("local", &descriptors, &ResourceFilter::all())
            .await
            .expect("plan");

        let labels: Vec<String> = plan.items().iter().map(PlanItem::label).collect();
        assert_eq!(
            labels,
            vec![
                "component_template/a",
                "index_template/x",
                "lifecycle_policy/a",
                "lifecycle_policy/b",
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_descriptors_rejected() {
        let err = planner(Arc::new(MockTransport::new()))
            .plan("local", &[policy("p", "1d"), policy("p", "2d")], &ResourceFilter::all())
            .await
            .expect_err("duplicate");
        assert!(matches!(
            err,
            ElastiformError::Plan(PlanError::DuplicateResource { .. })
        ));
    }

    #[derive(Default)]
    struct CountingTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn get(&self, _path: &str) -> std::result::Result<Option<Value>, ClusterError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn put(&self, _path: &str, _body: &Value) -> std::result::Result<(), ClusterError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let transport = Arc::new(CountingTransport::default());
        let descriptors: Vec<ResourceDescriptor> =
            (0..8).map(|i| policy(&format!("p{i}"), "1d")).collect();

        let plan = planner(transport.clone())
            .with_concurrency(2)
            .plan("local", &descriptors, &ResourceFilter::all())
            .await
            .expect("plan");
        assert_eq!(plan.summary().create, 8);
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
        assert!(transport.peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let handler_registry = HandlerRegistry::new(Arc::new(MockTransport::new()));
        let handler = handler_registry.handler(ResourceKind::IndexTemplate);
        let local = ResourceDescriptor::new(
            ResourceKind::IndexTemplate,
            "logs",
            json!({ "index_patterns": ["logs-*"], "priority": 1, "version": 2 }),
        );
        let remote = json!({ "index_patterns": ["logs-*"], "priority": 5, "version": 9 });

        let first = classify(&local, handler.as_ref(), Some(&remote));
        let second = classify(&local, handler.as_ref(), Some(&remote));
        assert_eq!(first.action, PlanAction::Update);
        assert_eq!(first.changes, second.changes);
        assert_eq!(first.changes.len(), 1);
    }
}
