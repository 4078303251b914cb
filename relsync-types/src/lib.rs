//! Core type definitions for relsync.
//!
//! This crate defines the plain-data vocabulary shared by the model, the
//! engine and the tooling:
//! - Entity-type keys, record identifiers and batch identifiers
//! - The closed set of synchronization kinds (load, update, delete)
//! - The store's view of an entity instance (lifecycle state, queued actions)
//! - Outcome notifications and the per-entity action creators that build them
//! - The action-type string vocabulary used to trigger synchronization
//!
//! Nothing here performs I/O.

mod action;
mod ids;
mod notification;
mod state;

pub use action::{ActionKind, ActionType, Trigger, ACTION_PREFIX};
pub use ids::{BatchId, DataKey, RecordId};
pub use notification::{ActionCreators, Notification, NotificationKind};
pub use state::{ActionPayload, EntityState, LifecycleState, QueuedAction};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid action type: {0}")]
    InvalidActionType(String),

    #[error("invalid record identifier: {0}")]
    InvalidRecordId(String),
}
