//! Error types for the sync engine.

use relsync_model::RemoteError;
use relsync_types::{ActionKind, DataKey, RecordId};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The relation graph contains a cycle. Raised before any remote call.
    #[error(
        "circular dependency \"{target}\" required by \"{dependent}\" via \"{property}\": {}",
        join_chain(.chain)
    )]
    CircularDependency {
        target: DataKey,
        property: String,
        dependent: DataKey,
        chain: Vec<DataKey>,
    },

    /// The endpoint table has no function for this kind.
    #[error("Method not implemented")]
    MethodNotImplemented { kind: ActionKind },

    /// The endpoint function returned a plain value instead of a future.
    #[error("Invalid method implementation")]
    InvalidMethodImplementation { kind: ActionKind },

    /// The remote call raised or rejected.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The queued action has no actionable kind.
    #[error("Unhandled action")]
    UnhandledAction {
        data_key: DataKey,
        id: Option<RecordId>,
    },

    /// Nothing is queued for the entity instance.
    #[error("no pending action for {data_key} {}", describe_id(.id))]
    NoPendingAction {
        data_key: DataKey,
        id: Option<RecordId>,
    },

    /// The remote call did not settle within the configured deadline.
    #[error("operation timed out")]
    Timeout {
        data_key: DataKey,
        kind: ActionKind,
        after: Duration,
    },

    /// Skipped because a related type failed earlier in the same pass.
    #[error("parent \"{parent}\" failed earlier in this pass")]
    ParentFailed { data_key: DataKey, parent: DataKey },

    #[error("unknown action type: {0}")]
    UnknownActionType(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn join_chain(chain: &[DataKey]) -> String {
    chain
        .iter()
        .map(DataKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn describe_id(id: &Option<RecordId>) -> String {
    match id {
        Some(id) => format!("#{id}"),
        None => "(no id)".to_string(),
    }
}

/// Coarse classification of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid setup; fatal to the whole batch.
    Configuration,
    EndpointMissing,
    EndpointContract,
    RemoteCall,
    UnhandledAction,
    Timeout,
    Aborted,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::EndpointMissing => "endpoint-missing",
            ErrorCategory::EndpointContract => "endpoint-contract",
            ErrorCategory::RemoteCall => "remote-call",
            ErrorCategory::UnhandledAction => "unhandled-action",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Aborted => "aborted",
        })
    }
}

impl SyncError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::CircularDependency { .. }
            | SyncError::UnknownActionType(_)
            | SyncError::Serialization(_) => ErrorCategory::Configuration,
            SyncError::MethodNotImplemented { .. } => ErrorCategory::EndpointMissing,
            SyncError::InvalidMethodImplementation { .. } => ErrorCategory::EndpointContract,
            SyncError::Remote(_) => ErrorCategory::RemoteCall,
            SyncError::UnhandledAction { .. } | SyncError::NoPendingAction { .. } => {
                ErrorCategory::UnhandledAction
            }
            SyncError::Timeout { .. } => ErrorCategory::Timeout,
            SyncError::ParentFailed { .. } => ErrorCategory::Aborted,
        }
    }

    /// Whether the error aborts the whole batch rather than one operation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}
