//! Shared types for the `relsync` command line tool.
//!
//! A *scenario* is a JSON file describing schemas, initial store contents,
//! simulated endpoints and the actions to feed through the engine.

use anyhow::{Context, Result};
use relsync_engine::store::memory::MemoryStore;
use relsync_engine::{DependencyGraph, StoreAction, SyncConfig, SyncError, SyncInterceptor};
use relsync_model::{EndpointRegistry, EndpointReply, EndpointTable, RemoteError, SchemaRegistry};
use relsync_types::{ActionKind, DataKey, EntityState, Notification, QueuedAction, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// ── Plan ─────────────────────────────────────────────────────────

/// Sync levels of every registered entity type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Plan {
    pub levels: Vec<Vec<DataKey>>,
}

impl Plan {
    pub fn render_text(&self) -> String {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let names: Vec<&str> = level.iter().map(DataKey::as_str).collect();
                format!("level {i}: {}", names.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reads a schema registry from a JSON file.
pub fn load_schemas(path: &Path) -> Result<SchemaRegistry> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    SchemaRegistry::from_json(&json).context("Failed to parse schema file")
}

/// Computes the level plan for a registry.
pub fn plan(registry: &SchemaRegistry) -> Result<Plan, SyncError> {
    for (dependent, property, target) in registry.dangling_relations() {
        warn!("{dependent}.{property} references unregistered type {target}");
    }
    let levels = DependencyGraph::from_registry(registry).levels()?;
    Ok(Plan { levels })
}

// ── Scenario ─────────────────────────────────────────────────────

/// A queued action and the type it belongs to.
#[derive(Deserialize, Clone, Debug)]
pub struct QueuedEntry {
    pub data_key: DataKey,
    #[serde(flatten)]
    pub action: QueuedAction,
}

/// An initial entity state.
#[derive(Deserialize, Clone, Debug)]
pub struct StateEntry {
    pub data_key: DataKey,
    pub id: RecordId,
    #[serde(flatten)]
    pub state: EntityState,
}

/// How a simulated endpoint behaves.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimulatedEndpoint {
    /// Resolves with `body`, or echoes the payload. `assign_id` overwrites
    /// the record identifier of the response.
    Respond {
        #[serde(default)]
        body: Option<Value>,
        #[serde(default)]
        delay_ms: u64,
        #[serde(default)]
        assign_id: Option<RecordId>,
    },
    /// Rejects with `message`.
    Reject {
        message: String,
        #[serde(default)]
        delay_ms: u64,
    },
    /// Fails before returning a future.
    Raise { message: String },
    /// Returns a plain value instead of a future.
    Plain {
        #[serde(default)]
        body: Value,
    },
}

/// Simulated load/update/delete of one type. Absent entries are not
/// implemented.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct EndpointSpecs {
    #[serde(default)]
    pub load: Option<SimulatedEndpoint>,
    #[serde(default)]
    pub update: Option<SimulatedEndpoint>,
    #[serde(default)]
    pub delete: Option<SimulatedEndpoint>,
}

impl EndpointSpecs {
    fn get(&self, kind: ActionKind) -> Option<&SimulatedEndpoint> {
        match kind {
            ActionKind::Load => self.load.as_ref(),
            ActionKind::Update => self.update.as_ref(),
            ActionKind::Delete => self.delete.as_ref(),
        }
    }

    /// Builds the endpoint table. `record_key` is where `assign_id` lands.
    pub fn to_table(&self, record_key: &str) -> EndpointTable {
        let mut table = EndpointTable::new();
        for kind in ActionKind::ALL {
            if let Some(simulated) = self.get(kind) {
                table = simulate(table, kind, simulated.clone(), record_key.to_string());
            }
        }
        table
    }
}

fn simulate(
    table: EndpointTable,
    kind: ActionKind,
    simulated: SimulatedEndpoint,
    record_key: String,
) -> EndpointTable {
    match simulated {
        SimulatedEndpoint::Respond {
            body,
            delay_ms,
            assign_id,
        } => table.with_async(kind, move |payload| {
            let mut response = body.clone().unwrap_or(payload);
            if let (Some(id), Some(map)) = (&assign_id, response.as_object_mut()) {
                map.insert(record_key.clone(), id.to_value());
            }
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(response)
            }
        }),
        SimulatedEndpoint::Reject { message, delay_ms } => table.with_async(kind, move |_| {
            let message = message.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(RemoteError::new(message))
            }
        }),
        SimulatedEndpoint::Raise { message } => {
            table.with_endpoint(kind, move |_| Err(RemoteError::new(message.clone())))
        }
        SimulatedEndpoint::Plain { body } => {
            table.with_endpoint(kind, move |_| Ok(EndpointReply::Ready(body.clone())))
        }
    }
}

/// A complete simulation input.
#[derive(Deserialize, Clone, Debug)]
pub struct Scenario {
    #[serde(default)]
    pub config: SyncConfig,
    #[serde(default)]
    pub schemas: SchemaRegistry,
    #[serde(default)]
    pub queue: Vec<QueuedEntry>,
    #[serde(default)]
    pub states: Vec<StateEntry>,
    #[serde(default)]
    pub endpoints: BTreeMap<DataKey, EndpointSpecs>,
    #[serde(default)]
    pub actions: Vec<StoreAction>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse scenario file")
    }
}

/// Summary of one action's pass.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PassSummary {
    pub action: String,
    pub batch: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    /// Set when the action was not processed.
    pub error: Option<String>,
}

/// Everything a scenario run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub notifications: Vec<Notification>,
    pub passes: Vec<PassSummary>,
}

impl RunOutcome {
    pub fn failed(&self) -> usize {
        self.passes.iter().map(|p| p.failed).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.passes.iter().map(|p| p.succeeded).sum()
    }
}

/// Feeds every scenario action through an interceptor backed by a
/// [`MemoryStore`]. A cyclic schema aborts the run before any call.
pub async fn run_scenario(scenario: Scenario) -> Result<RunOutcome> {
    let Scenario {
        config,
        schemas,
        queue,
        states,
        endpoints: simulated,
        actions,
    } = scenario;

    let store = MemoryStore::with_store_key(config.store_key.clone()).schemas(schemas.clone());
    for entry in queue {
        store.enqueue(entry.data_key, entry.action);
    }
    for entry in states {
        store.set_entity_state(entry.data_key, entry.id, entry.state);
    }
    let store = Arc::new(store);

    let mut endpoints = EndpointRegistry::new();
    for (data_key, endpoint) in &simulated {
        endpoints.register(data_key.clone(), endpoint.to_table(schemas.record_key(data_key)));
    }

    let interceptor = SyncInterceptor::new(store.clone(), store.clone(), endpoints, config);
    interceptor.validate().context("Invalid relation graph")?;

    let mut passes = Vec::with_capacity(actions.len());
    for action in &actions {
        info!(action = %action.action_type, "dispatching");
        let summary = match interceptor.handle(action).await {
            Ok(report) => PassSummary {
                action: action.action_type.clone(),
                batch: Some(report.batch_id.to_string()),
                succeeded: report.succeeded(),
                failed: report.failed(),
                elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
                error: None,
            },
            Err(err) if err.is_fatal() && !matches!(err, SyncError::UnknownActionType(_)) => {
                return Err(err).context("Sync pass aborted");
            }
            Err(err) => PassSummary {
                action: action.action_type.clone(),
                batch: None,
                succeeded: 0,
                failed: 0,
                elapsed_ms: 0,
                error: Some(err.to_string()),
            },
        };
        passes.push(summary);
    }

    Ok(RunOutcome {
        notifications: store.take_notifications(),
        passes,
    })
}

/// One notification as a JSON line, tagged with its action type.
pub fn notification_line(notification: &Notification) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Line<'a> {
        #[serde(rename = "type")]
        action_type: String,
        #[serde(flatten)]
        notification: &'a Notification,
    }

    serde_json::to_string(&Line {
        action_type: notification.action_type(),
        notification,
    })
}
