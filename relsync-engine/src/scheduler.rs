//! Sync scheduler.
//!
//! Runs resolved levels one after another. Every operation of a level is
//! launched at once and the level is joined as a whole, successes and
//! failures alike, before the next level starts. Parents therefore settle
//! (and the store records any identifier they were assigned) before their
//! dependents read it.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::graph::resolve;
use crate::invoker::Invoker;
use crate::notifier::OutcomeHandlers;
use crate::operation::{Operation, OperationSet, SyncLevel};
use crate::store::{NotificationSink, StateStore};
use futures::future::join_all;
use relsync_model::EndpointRegistry;
use relsync_types::{
    ActionCreators, ActionKind, ActionPayload, BatchId, DataKey, LifecycleState, RecordId,
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

/// What happened to one operation.
#[derive(Debug)]
pub struct OperationOutcome {
    pub data_key: DataKey,
    pub id: Option<RecordId>,
    /// `None` if the operation failed before a kind was known.
    pub kind: Option<ActionKind>,
    pub result: SyncResult<Value>,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of one scheduling pass.
#[derive(Debug)]
pub struct SyncReport {
    pub batch_id: BatchId,
    /// Outcomes in level order.
    pub outcomes: Vec<OperationOutcome>,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether every operation succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(OperationOutcome::is_success)
    }

    /// Outcomes for one entity type.
    pub fn outcomes_for<'a>(
        &'a self,
        data_key: &'a DataKey,
    ) -> impl Iterator<Item = &'a OperationOutcome> + 'a {
        self.outcomes.iter().filter(move |o| &o.data_key == data_key)
    }
}

/// A fully determined remote call.
struct Prepared {
    kind: ActionKind,
    id: Option<RecordId>,
    payload: Value,
}

/// Executes operation sets level by level.
pub struct Scheduler {
    store: Arc<dyn StateStore>,
    endpoints: Arc<EndpointRegistry>,
    invoker: Invoker,
    sink: Arc<dyn NotificationSink>,
    config: SyncConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn StateStore>,
        sink: Arc<dyn NotificationSink>,
        endpoints: Arc<EndpointRegistry>,
        config: SyncConfig,
    ) -> Self {
        Self {
            invoker: Invoker::new(sink.clone(), config.operation_timeout()),
            store,
            endpoints,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Resolves and runs an operation set. A cyclic relation graph fails
    /// before any remote call.
    pub async fn sync(&self, set: &OperationSet) -> SyncResult<SyncReport> {
        let levels = resolve(set)?;
        Ok(self.run(levels).await)
    }

    /// Runs resolved levels. Never short-circuits.
    pub async fn run(&self, levels: Vec<SyncLevel>) -> SyncReport {
        let batch_id = BatchId::new();
        let span = info_span!("sync_pass", batch = %batch_id);
        async move {
            let started = Instant::now();
            let mut outcomes = Vec::new();
            let mut failed: HashSet<DataKey> = HashSet::new();

            for (index, level) in levels.iter().enumerate() {
                info!(
                    level = index,
                    types = ?level.data_keys,
                    operations = level.operations.len(),
                    "running sync level"
                );
                let settled = join_all(
                    level
                        .operations
                        .iter()
                        .map(|operation| self.execute(operation, &failed)),
                )
                .await;
                for outcome in settled {
                    if !outcome.is_success() {
                        failed.insert(outcome.data_key.clone());
                    }
                    outcomes.push(outcome);
                }
            }

            let report = SyncReport {
                batch_id,
                outcomes,
                elapsed: started.elapsed(),
            };
            info!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "sync pass finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, operation: &Operation, failed: &HashSet<DataKey>) -> OperationOutcome {
        let creators = ActionCreators::new(operation.data_key.clone());
        let prepared = match self.prepare(operation) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(data_key = %operation.data_key, error = %err, "operation rejected");
                self.sink
                    .dispatch(creators.sync_rejected(operation.id.clone(), err.to_string()));
                return OperationOutcome {
                    data_key: operation.data_key.clone(),
                    id: operation.id.clone(),
                    kind: None,
                    result: Err(err),
                };
            }
        };

        let handlers = OutcomeHandlers::for_kind(prepared.kind, prepared.id.clone(), &creators);
        let result = match self.failed_parent(operation, failed) {
            Some(parent) => {
                let err = SyncError::ParentFailed {
                    data_key: operation.data_key.clone(),
                    parent: parent.clone(),
                };
                warn!(data_key = %operation.data_key, %parent, "skipping operation");
                self.sink.dispatch(handlers.failed(err.to_string()));
                Err(err)
            }
            None => {
                self.invoker
                    .invoke(
                        &operation.data_key,
                        self.endpoints.get(&operation.data_key),
                        prepared.kind,
                        prepared.payload,
                        &handlers,
                    )
                    .await
            }
        };

        OperationOutcome {
            data_key: operation.data_key.clone(),
            id: prepared.id,
            kind: Some(prepared.kind),
            result,
        }
    }

    fn failed_parent<'a>(
        &self,
        operation: &'a Operation,
        failed: &HashSet<DataKey>,
    ) -> Option<&'a DataKey> {
        if !self.config.abort_on_parent_failure {
            return None;
        }
        operation.relations.values().find(|target| failed.contains(*target))
    }

    /// Decides the kind, identifier and outgoing payload of an operation.
    fn prepare(&self, operation: &Operation) -> SyncResult<Prepared> {
        if let Some(payload) = &operation.load_payload {
            return Ok(Prepared {
                kind: ActionKind::Load,
                id: None,
                payload: payload.clone(),
            });
        }

        let no_pending = || SyncError::NoPendingAction {
            data_key: operation.data_key.clone(),
            id: operation.id.clone(),
        };
        let queued = match &operation.id {
            Some(id) => self
                .store
                .pending_actions(&self.config.store_key, &operation.data_key, Some(id))
                .into_iter()
                .next()
                .ok_or_else(no_pending)?,
            None => return Err(no_pending()),
        };

        let kind = queued.action.ok_or_else(|| SyncError::UnhandledAction {
            data_key: operation.data_key.clone(),
            id: operation.id.clone(),
        })?;
        if kind == ActionKind::Load {
            return Ok(Prepared {
                kind,
                id: None,
                payload: queued.payload,
            });
        }

        let record_key = operation.record_key.as_str();
        let parsed = ActionPayload::parse(&queued.payload);
        let id = parsed.record_id(record_key).or_else(|| operation.id.clone());
        let mut entity = parsed.entity.unwrap_or_default();
        entity.remove(record_key);
        if queued.state != Some(LifecycleState::New)
            && let Some(id) = &id
        {
            entity.insert(record_key.to_string(), id.to_value());
        }
        self.substitute_updated_ids(operation, &mut entity);

        debug!(data_key = %operation.data_key, %kind, id = ?id, "prepared operation");
        Ok(Prepared {
            kind,
            id,
            payload: Value::Object(entity),
        })
    }

    /// Replaces foreign keys whose target was just assigned a new identifier.
    fn substitute_updated_ids(&self, operation: &Operation, entity: &mut Map<String, Value>) {
        for (property, target) in &operation.relations {
            let Some(foreign_id) = entity.get(property).and_then(RecordId::from_value) else {
                continue;
            };
            let state = self
                .store
                .entity_state(&self.config.store_key, target, &foreign_id);
            if let Some(updated) = state.updated_identifier() {
                debug!(
                    data_key = %operation.data_key,
                    %property,
                    from = %foreign_id,
                    to = %updated,
                    "substituting updated identifier"
                );
                entity.insert(property.clone(), updated.to_value());
            }
        }
    }
}
