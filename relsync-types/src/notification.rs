//! Outcome notifications dispatched back into the state store.
//!
//! The store's reducers destructure these positionally, so the action
//! creators keep a fixed argument order: `update_succeeded(payload, id)` but
//! `update_failed(id, error)`, and `delete_*(id, ..)`.

use crate::{ACTION_PREFIX, DataKey, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant of a [`Notification`], used for action-type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    LoadSucceeded,
    LoadFailed,
    UpdateSucceeded,
    UpdateFailed,
    DeleteSucceeded,
    DeleteFailed,
    SyncRejected,
}

impl NotificationKind {
    /// The action-type suffix for this kind.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            NotificationKind::LoadSucceeded => "LOAD_SUCCEEDED",
            NotificationKind::LoadFailed => "LOAD_FAILED",
            NotificationKind::UpdateSucceeded => "UPDATE_SUCCEEDED",
            NotificationKind::UpdateFailed => "UPDATE_FAILED",
            NotificationKind::DeleteSucceeded => "DELETE_SUCCEEDED",
            NotificationKind::DeleteFailed => "DELETE_FAILED",
            NotificationKind::SyncRejected => "SYNC_REJECTED",
        }
    }

    /// Whether this kind reports a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            NotificationKind::LoadFailed
                | NotificationKind::UpdateFailed
                | NotificationKind::DeleteFailed
                | NotificationKind::SyncRejected
        )
    }
}

/// An outcome notification for one remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// Records were loaded. Loads have no single target identifier.
    LoadSucceeded { data_key: DataKey, payload: Value },

    /// A load failed.
    LoadFailed { data_key: DataKey, error: String },

    /// A record was created or updated; `payload` is the remote response.
    UpdateSucceeded {
        data_key: DataKey,
        payload: Value,
        id: Option<RecordId>,
    },

    /// A create or update failed.
    UpdateFailed {
        data_key: DataKey,
        id: Option<RecordId>,
        error: String,
    },

    /// A record was deleted; `payload` is the remote response.
    DeleteSucceeded {
        data_key: DataKey,
        id: Option<RecordId>,
        payload: Value,
    },

    /// A deletion failed.
    DeleteFailed {
        data_key: DataKey,
        id: Option<RecordId>,
        error: String,
    },

    /// The operation could not even be classified (nothing queued, or
    /// nothing actionable), so no kind-specific failure applies.
    SyncRejected {
        data_key: DataKey,
        id: Option<RecordId>,
        error: String,
    },
}

impl Notification {
    /// The notification's discriminant.
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::LoadSucceeded { .. } => NotificationKind::LoadSucceeded,
            Notification::LoadFailed { .. } => NotificationKind::LoadFailed,
            Notification::UpdateSucceeded { .. } => NotificationKind::UpdateSucceeded,
            Notification::UpdateFailed { .. } => NotificationKind::UpdateFailed,
            Notification::DeleteSucceeded { .. } => NotificationKind::DeleteSucceeded,
            Notification::DeleteFailed { .. } => NotificationKind::DeleteFailed,
            Notification::SyncRejected { .. } => NotificationKind::SyncRejected,
        }
    }

    /// The entity type this notification is about.
    #[must_use]
    pub fn data_key(&self) -> &DataKey {
        match self {
            Notification::LoadSucceeded { data_key, .. }
            | Notification::LoadFailed { data_key, .. }
            | Notification::UpdateSucceeded { data_key, .. }
            | Notification::UpdateFailed { data_key, .. }
            | Notification::DeleteSucceeded { data_key, .. }
            | Notification::DeleteFailed { data_key, .. }
            | Notification::SyncRejected { data_key, .. } => data_key,
        }
    }

    /// The target record, if the notification has one.
    #[must_use]
    pub fn id(&self) -> Option<&RecordId> {
        match self {
            Notification::LoadSucceeded { .. } | Notification::LoadFailed { .. } => None,
            Notification::UpdateSucceeded { id, .. }
            | Notification::UpdateFailed { id, .. }
            | Notification::DeleteSucceeded { id, .. }
            | Notification::DeleteFailed { id, .. }
            | Notification::SyncRejected { id, .. } => id.as_ref(),
        }
    }

    /// The failure message, for failure notifications.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Notification::LoadFailed { error, .. }
            | Notification::UpdateFailed { error, .. }
            | Notification::DeleteFailed { error, .. }
            | Notification::SyncRejected { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The remote response, for success notifications.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Notification::LoadSucceeded { payload, .. }
            | Notification::UpdateSucceeded { payload, .. }
            | Notification::DeleteSucceeded { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Whether this notification reports a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.kind().is_failure()
    }

    /// The store action-type string, e.g. `@@relsync/users/UPDATE_SUCCEEDED`.
    #[must_use]
    pub fn action_type(&self) -> String {
        format!("{ACTION_PREFIX}{}/{}", self.data_key(), self.kind().suffix())
    }
}

/// Entity-type-specific notification factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreators {
    data_key: DataKey,
}

impl ActionCreators {
    /// Creates the factory for one entity type.
    pub fn new(data_key: impl Into<DataKey>) -> Self {
        Self {
            data_key: data_key.into(),
        }
    }

    /// The entity type this factory builds notifications for.
    #[must_use]
    pub fn data_key(&self) -> &DataKey {
        &self.data_key
    }

    pub fn load_succeeded(&self, payload: Value) -> Notification {
        Notification::LoadSucceeded {
            data_key: self.data_key.clone(),
            payload,
        }
    }

    pub fn load_failed(&self, error: impl Into<String>) -> Notification {
        Notification::LoadFailed {
            data_key: self.data_key.clone(),
            error: error.into(),
        }
    }

    pub fn update_succeeded(&self, payload: Value, id: Option<RecordId>) -> Notification {
        Notification::UpdateSucceeded {
            data_key: self.data_key.clone(),
            payload,
            id,
        }
    }

    pub fn update_failed(&self, id: Option<RecordId>, error: impl Into<String>) -> Notification {
        Notification::UpdateFailed {
            data_key: self.data_key.clone(),
            id,
            error: error.into(),
        }
    }

    pub fn delete_succeeded(&self, id: Option<RecordId>, payload: Value) -> Notification {
        Notification::DeleteSucceeded {
            data_key: self.data_key.clone(),
            id,
            payload,
        }
    }

    pub fn delete_failed(&self, id: Option<RecordId>, error: impl Into<String>) -> Notification {
        Notification::DeleteFailed {
            data_key: self.data_key.clone(),
            id,
            error: error.into(),
        }
    }

    pub fn sync_rejected(&self, id: Option<RecordId>, error: impl Into<String>) -> Notification {
        Notification::SyncRejected {
            data_key: self.data_key.clone(),
            id,
            error: error.into(),
        }
    }
}
