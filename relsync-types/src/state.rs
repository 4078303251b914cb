//! The store's view of entity instances.
//!
//! These mirror what the application's state store reports through its
//! selectors: the lifecycle state of one record, and the queue of actions
//! still waiting to be pushed to the remote API.

use crate::{ActionKind, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where an entity instance sits in its save lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// Created locally, never saved remotely. Has no server identifier yet.
    New,
    /// Saved before, modified locally since.
    Modified,
    /// Deleted locally, not yet remotely.
    Deleted,
    /// In sync with the remote API.
    Synced,
    /// Just saved and got a new identifier from the remote API.
    IdUpdated,
}

/// Lifecycle state of one entity instance, as returned by the state selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(default)]
    pub state: Option<LifecycleState>,
    #[serde(default)]
    pub updated_id: Option<RecordId>,
}

impl EntityState {
    /// An entity in the given state with no identifier change.
    #[must_use]
    pub fn new(state: LifecycleState) -> Self {
        Self {
            state: Some(state),
            updated_id: None,
        }
    }

    /// An entity that was just assigned `updated_id` by the remote API.
    pub fn id_updated(updated_id: impl Into<RecordId>) -> Self {
        Self {
            state: Some(LifecycleState::IdUpdated),
            updated_id: Some(updated_id.into()),
        }
    }

    /// The freshly assigned identifier, if the store reports one.
    #[must_use]
    pub fn updated_identifier(&self) -> Option<&RecordId> {
        match self.state {
            Some(LifecycleState::IdUpdated) => self.updated_id.as_ref(),
            _ => None,
        }
    }
}

/// One pending action in the store's sync queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Record the action targets (absent for loads).
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Remote operation to perform. `None` means nothing actionable is queued.
    #[serde(default)]
    pub action: Option<ActionKind>,
    /// Action payload, usually `{ "entity": {...}, "entityId": ... }`.
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub state: Option<LifecycleState>,
    #[serde(default)]
    pub updated_id: Option<RecordId>,
}

impl QueuedAction {
    fn with_kind(id: Option<RecordId>, action: Option<ActionKind>, payload: Value) -> Self {
        Self {
            id,
            action,
            payload,
            state: None,
            updated_id: None,
        }
    }

    /// A queued update of `id`.
    pub fn update(id: impl Into<RecordId>, payload: Value) -> Self {
        Self::with_kind(Some(id.into()), Some(ActionKind::Update), payload)
    }

    /// A queued deletion of `id`.
    pub fn delete(id: impl Into<RecordId>, payload: Value) -> Self {
        Self::with_kind(Some(id.into()), Some(ActionKind::Delete), payload)
    }

    /// A queued load.
    #[must_use]
    pub fn load(payload: Value) -> Self {
        Self::with_kind(None, Some(ActionKind::Load), payload)
    }

    /// A queue entry with no actionable kind.
    pub fn idle(id: impl Into<RecordId>) -> Self {
        Self::with_kind(Some(id.into()), None, Value::Null)
    }

    /// Sets the lifecycle state reported alongside the action.
    #[must_use]
    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = Some(state);
        self
    }
}

/// The `{ entity, entityId }` shape carried by sync actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<RecordId>,
}

impl ActionPayload {
    /// Reads the payload shape out of an arbitrary JSON value.
    ///
    /// Lenient: a non-object `entity` or a non-identifier `entityId` is
    /// treated as absent.
    #[must_use]
    pub fn parse(value: &Value) -> Self {
        Self {
            entity: value
                .get("entity")
                .and_then(Value::as_object)
                .cloned(),
            entity_id: value.get("entityId").and_then(RecordId::from_value),
        }
    }

    /// The identifier embedded in the entity under `record_key`, falling
    /// back to the separately supplied `entityId`.
    #[must_use]
    pub fn record_id(&self, record_key: &str) -> Option<RecordId> {
        self.entity
            .as_ref()
            .and_then(|entity| entity.get(record_key))
            .and_then(RecordId::from_value)
            .or_else(|| self.entity_id.clone())
    }

    /// Converts back to JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(entity) = &self.entity {
            map.insert("entity".into(), Value::Object(entity.clone()));
        }
        if let Some(id) = &self.entity_id {
            map.insert("entityId".into(), id.to_value());
        }
        Value::Object(map)
    }
}
