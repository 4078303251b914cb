//! Store collaborator contracts.
//!
//! The engine never owns application state. It reads through a
//! [`StateStore`] and writes only by dispatching [`Notification`]s into a
//! [`NotificationSink`]; both are handed in explicitly.
//!
//! Per-instance reads take the store key the engine was configured with,
//! the slice of application state that holds the sync queue and entity
//! states. Schema lookups are keyed by entity type alone.

use relsync_model::RelationMap;
use relsync_types::{DataKey, EntityState, Notification, QueuedAction, RecordId};

/// Read access to the application's state store.
pub trait StateStore: Send + Sync {
    /// Pending queued actions of a type under `store_key`, oldest first.
    /// With `id`, only the actions targeting that record.
    fn pending_actions(
        &self,
        store_key: &str,
        data_key: &DataKey,
        id: Option<&RecordId>,
    ) -> Vec<QueuedAction>;

    /// Record-identifier field of a type.
    fn record_key(&self, data_key: &DataKey) -> String;

    /// Declared relations of a type.
    fn relations(&self, data_key: &DataKey) -> RelationMap;

    /// Lifecycle state of one entity instance under `store_key`.
    fn entity_state(&self, store_key: &str, data_key: &DataKey, id: &RecordId) -> EntityState;

    /// Every entity type the store knows, in registration order.
    fn data_keys(&self) -> Vec<DataKey>;
}

/// Write access to the store: outcome notifications only.
pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notification: Notification);
}

/// In-memory store for tests and tooling.
pub mod memory {
    use super::*;
    use crate::config::DEFAULT_STORE_KEY;
    use relsync_model::{DEFAULT_RECORD_KEY, EntitySchema, ModelResult, SchemaRegistry};
    use relsync_types::{ActionKind, LifecycleState};
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError, RwLock};
    use tracing::debug;

    /// A [`StateStore`] and [`NotificationSink`] over plain maps.
    ///
    /// Everything lives under one store key; reads under any other key see
    /// an empty store.
    ///
    /// Dispatched notifications are recorded and run through a small reducer:
    /// a successful update whose response carries a different identifier
    /// marks the old identifier `ID_UPDATED`, and every successful update or
    /// delete drops the matching queued action. A successful load drops the
    /// oldest queued load.
    #[derive(Debug)]
    pub struct MemoryStore {
        store_key: String,
        schemas: RwLock<SchemaRegistry>,
        queues: RwLock<HashMap<DataKey, Vec<QueuedAction>>>,
        states: RwLock<HashMap<(DataKey, RecordId), EntityState>>,
        notifications: Mutex<Vec<Notification>>,
    }

    impl Default for MemoryStore {
        fn default() -> Self {
            Self::with_store_key(DEFAULT_STORE_KEY)
        }
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a store keeping its state under `store_key`.
        pub fn with_store_key(store_key: impl Into<String>) -> Self {
            Self {
                store_key: store_key.into(),
                schemas: RwLock::default(),
                queues: RwLock::default(),
                states: RwLock::default(),
                notifications: Mutex::default(),
            }
        }

        /// Creates a store knowing every schema in `registry`.
        pub fn with_schemas(registry: SchemaRegistry) -> Self {
            Self::default().schemas(registry)
        }

        /// Replaces every known schema.
        #[must_use]
        pub fn schemas(self, registry: SchemaRegistry) -> Self {
            *self.schemas.write().unwrap_or_else(PoisonError::into_inner) = registry;
            self
        }

        pub fn store_key(&self) -> &str {
            &self.store_key
        }

        pub fn register_schema(&self, schema: EntitySchema) -> ModelResult<()> {
            self.schemas
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .register(schema)
        }

        /// Appends an action to a type's queue.
        pub fn enqueue(&self, data_key: impl Into<DataKey>, action: QueuedAction) {
            self.queues
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(data_key.into())
                .or_default()
                .push(action);
        }

        pub fn set_entity_state(
            &self,
            data_key: impl Into<DataKey>,
            id: impl Into<RecordId>,
            state: EntityState,
        ) {
            self.states
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((data_key.into(), id.into()), state);
        }

        /// Everything still queued for a type.
        pub fn queued(&self, data_key: &DataKey) -> Vec<QueuedAction> {
            self.pending_actions(&self.store_key, data_key, None)
        }

        /// Every notification dispatched so far, in dispatch order.
        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Drains the recorded notifications.
        pub fn take_notifications(&self) -> Vec<Notification> {
            std::mem::take(&mut *self.notifications.lock().unwrap_or_else(PoisonError::into_inner))
        }

        fn dequeue(&self, data_key: &DataKey, matches: impl Fn(&QueuedAction) -> bool) {
            let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(queue) = queues.get_mut(data_key)
                && let Some(pos) = queue.iter().position(matches)
            {
                queue.remove(pos);
            }
        }

        fn owns(&self, store_key: &str) -> bool {
            if store_key == self.store_key {
                return true;
            }
            debug!(store_key, own = %self.store_key, "read under a foreign store key");
            false
        }

        fn reduce(&self, notification: &Notification) {
            match notification {
                Notification::UpdateSucceeded {
                    data_key,
                    payload,
                    id,
                } => {
                    self.dequeue(data_key, |a| a.id.as_ref() == id.as_ref());
                    let Some(old) = id else { return };
                    let record_key = self.record_key(data_key);
                    let assigned = payload.get(&record_key).and_then(RecordId::from_value);
                    let state = match assigned {
                        Some(new) if &new != old => {
                            debug!(%data_key, %old, %new, "identifier updated");
                            self.set_entity_state(
                                data_key.clone(),
                                new.clone(),
                                EntityState::new(LifecycleState::Synced),
                            );
                            EntityState::id_updated(new)
                        }
                        _ => EntityState::new(LifecycleState::Synced),
                    };
                    self.set_entity_state(data_key.clone(), old.clone(), state);
                }
                Notification::DeleteSucceeded { data_key, id, .. } => {
                    self.dequeue(data_key, |a| a.id.as_ref() == id.as_ref());
                    if let Some(id) = id {
                        self.states
                            .write()
                            .unwrap_or_else(PoisonError::into_inner)
                            .remove(&(data_key.clone(), id.clone()));
                    }
                }
                Notification::LoadSucceeded { data_key, .. } => {
                    self.dequeue(data_key, |a| a.action == Some(ActionKind::Load));
                }
                _ => {}
            }
        }
    }

    impl StateStore for MemoryStore {
        fn pending_actions(
            &self,
            store_key: &str,
            data_key: &DataKey,
            id: Option<&RecordId>,
        ) -> Vec<QueuedAction> {
            if !self.owns(store_key) {
                return Vec::new();
            }
            let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
            queues
                .get(data_key)
                .map(|queue| {
                    queue
                        .iter()
                        .filter(|a| id.is_none() || a.id.as_ref() == id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        }

        fn record_key(&self, data_key: &DataKey) -> String {
            let schemas = self.schemas.read().unwrap_or_else(PoisonError::into_inner);
            if schemas.contains(data_key) {
                schemas.record_key(data_key).to_string()
            } else {
                DEFAULT_RECORD_KEY.to_string()
            }
        }

        fn relations(&self, data_key: &DataKey) -> RelationMap {
            self.schemas
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .relations(data_key)
        }

        fn entity_state(&self, store_key: &str, data_key: &DataKey, id: &RecordId) -> EntityState {
            if !self.owns(store_key) {
                return EntityState::default();
            }
            let key = (data_key.clone(), id.clone());
            if let Some(state) = self
                .states
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
            {
                return state.clone();
            }
            // Fall back to what the queued action itself reports.
            self.pending_actions(store_key, data_key, Some(id))
                .into_iter()
                .next()
                .map(|a| EntityState {
                    state: a.state,
                    updated_id: a.updated_id,
                })
                .unwrap_or_default()
        }

        fn data_keys(&self) -> Vec<DataKey> {
            let mut keys: Vec<DataKey> = self
                .schemas
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .data_keys()
                .cloned()
                .collect();
            let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
            let mut extra: Vec<&DataKey> = queues.keys().filter(|k| !keys.contains(k)).collect();
            extra.sort();
            keys.extend(extra.into_iter().cloned());
            keys
        }
    }

    impl NotificationSink for MemoryStore {
        fn dispatch(&self, notification: Notification) {
            debug!(action = %notification.action_type(), "dispatch");
            self.reduce(&notification);
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
        }
    }

    /// A sink that records notifications and nothing else.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn dispatch(&self, notification: Notification) {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
        }
    }
}
