//! Entry point: classifies store actions and drives the scheduler.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::graph::DependencyGraph;
use crate::operation::{Operation, OperationSet};
use crate::scheduler::{Scheduler, SyncReport};
use crate::store::{NotificationSink, StateStore};
use relsync_model::EndpointRegistry;
use relsync_types::{ActionKind, ActionPayload, ActionType, DataKey, RecordId, Trigger};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// An action as it passes through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl StoreAction {
    pub fn new(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }

    /// The action of `trigger` for `data_key`.
    pub fn trigger(data_key: impl Into<DataKey>, trigger: Trigger, payload: Value) -> Self {
        Self::new(ActionType::new(data_key, trigger).to_string(), payload)
    }
}

/// Watches store actions and synchronizes whatever they ask for.
#[derive(Clone)]
pub struct SyncInterceptor {
    store: Arc<dyn StateStore>,
    scheduler: Arc<Scheduler>,
}

impl SyncInterceptor {
    pub fn new(
        store: Arc<dyn StateStore>,
        sink: Arc<dyn NotificationSink>,
        endpoints: EndpointRegistry,
        config: SyncConfig,
    ) -> Self {
        debug!(store_key = %config.store_key, "creating sync interceptor");
        let scheduler = Scheduler::new(store.clone(), sink, Arc::new(endpoints), config);
        Self {
            store,
            scheduler: Arc::new(scheduler),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        self.scheduler.config()
    }

    /// Checks the relation graph of every type the store knows for cycles.
    pub fn validate(&self) -> SyncResult<()> {
        let mut graph = DependencyGraph::new();
        for data_key in self.store.data_keys() {
            let relations = self.store.relations(&data_key);
            graph.add_node(data_key, relations);
        }
        graph.validate()
    }

    /// The operations an action asks for, or `None` if relsync does not
    /// react to it.
    pub fn operations_for(&self, action: &StoreAction) -> Option<OperationSet> {
        let action_type = ActionType::parse(&action.action_type)?;
        let mut set = OperationSet::new();
        match (action_type.data_key, action_type.trigger) {
            (None, _) => {
                for data_key in self.store.data_keys() {
                    self.gather_pending(&mut set, &data_key);
                }
            }
            (Some(data_key), Trigger::UpdateSync | Trigger::DeleteSync) => {
                let record_key = self.store.record_key(&data_key);
                let relations = self.store.relations(&data_key);
                let payload = ActionPayload::parse(&action.payload);
                let id = payload
                    .entity_id
                    .clone()
                    .or_else(|| payload.record_id(&record_key));
                set.push(Operation::sync(data_key, record_key, id).with_relations(relations));
            }
            (Some(data_key), Trigger::Load) => {
                let record_key = self.store.record_key(&data_key);
                set.push(Operation::load(data_key, record_key, action.payload.clone()));
            }
            (Some(data_key), Trigger::SyncAll) => self.gather_pending(&mut set, &data_key),
        }
        Some(set)
    }

    /// One operation per distinct record with queued actions, plus one per
    /// queued load. Id-less entries of any other kind still get an
    /// operation so the scheduler rejects them.
    fn gather_pending(&self, set: &mut OperationSet, data_key: &DataKey) {
        let record_key = self.store.record_key(data_key);
        let relations = self.store.relations(data_key);
        let store_key = &self.config().store_key;
        let mut seen: Vec<RecordId> = Vec::new();
        for queued in self.store.pending_actions(store_key, data_key, None) {
            let operation = match queued.id {
                Some(id) if seen.contains(&id) => continue,
                Some(id) => {
                    seen.push(id.clone());
                    Operation::sync(data_key.clone(), record_key.clone(), Some(id))
                }
                None if queued.action == Some(ActionKind::Load) => {
                    Operation::load(data_key.clone(), record_key.clone(), queued.payload)
                }
                None => Operation::sync(data_key.clone(), record_key.clone(), None),
            };
            set.push(operation.with_relations(relations.clone()));
        }
    }

    /// Declares every type reachable through relations that the set does
    /// not already hold, so that cycles through types with nothing pending
    /// are still caught.
    fn declare_related(&self, set: &mut OperationSet) {
        let mut targets: Vec<DataKey> = set
            .iter()
            .flat_map(|(_, group)| group.relations.values().cloned())
            .collect();
        while let Some(target) = targets.pop() {
            if set.get(&target).is_some() {
                continue;
            }
            let relations = self.store.relations(&target);
            targets.extend(relations.values().cloned());
            set.declare(target, relations);
        }
    }

    /// Handles an action inline and waits for the whole pass.
    pub async fn handle(&self, action: &StoreAction) -> SyncResult<SyncReport> {
        let set = self
            .operations_for(action)
            .ok_or_else(|| SyncError::UnknownActionType(action.action_type.clone()))?;
        debug!(
            action = %action.action_type,
            types = set.len(),
            operations = set.operation_count(),
            "handling action"
        );
        self.sync(&set).await
    }

    /// Starts a pass for the action in the background. Returns `None` for
    /// actions relsync does not react to.
    pub fn observe(&self, action: StoreAction) -> Option<JoinHandle<SyncResult<SyncReport>>> {
        let set = self.operations_for(&action)?;
        let this = self.clone();
        Some(tokio::spawn(async move { this.sync(&set).await }))
    }

    /// Syncs every pending action of the given types in one pass.
    pub async fn sync_all(&self, data_keys: &[DataKey]) -> SyncResult<SyncReport> {
        let mut set = OperationSet::new();
        for data_key in data_keys {
            self.gather_pending(&mut set, data_key);
        }
        self.sync(&set).await
    }

    /// Runs an operation set through the scheduler. Related types the set
    /// lacks join the resolution with no operations of their own.
    pub async fn sync(&self, set: &OperationSet) -> SyncResult<SyncReport> {
        let mut set = set.clone();
        self.declare_related(&mut set);
        self.scheduler.sync(&set).await.inspect_err(|err| {
            error!(error = %err, "sync pass aborted");
        })
    }
}
