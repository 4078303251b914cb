//! Outcome notifier: shapes the notification for a settled remote call.
//!
//! Pure data shaping. The adapters fix the record identifier up front and
//! leave only the remote outcome to fill in, keeping each creator's
//! positional contract.

use relsync_types::{ActionCreators, ActionKind, Notification, RecordId};
use serde_json::Value;

/// Builds `update_succeeded(payload, id)`.
pub fn handle_update_success(
    id: Option<RecordId>,
    creators: ActionCreators,
) -> impl Fn(Value) -> Notification + Send + Sync {
    move |payload| creators.update_succeeded(payload, id.clone())
}

/// Builds `update_failed(id, error)`.
pub fn handle_update_failed(
    id: Option<RecordId>,
    creators: ActionCreators,
) -> impl Fn(String) -> Notification + Send + Sync {
    move |error| creators.update_failed(id.clone(), error)
}

/// Builds `delete_succeeded(id, payload)`.
pub fn handle_delete_success(
    id: Option<RecordId>,
    creators: ActionCreators,
) -> impl Fn(Value) -> Notification + Send + Sync {
    move |payload| creators.delete_succeeded(id.clone(), payload)
}

/// Builds `delete_failed(id, error)`.
pub fn handle_delete_failed(
    id: Option<RecordId>,
    creators: ActionCreators,
) -> impl Fn(String) -> Notification + Send + Sync {
    move |error| creators.delete_failed(id.clone(), error)
}

type Builder<T> = Box<dyn Fn(T) -> Notification + Send + Sync>;

/// The success and failure builders for one operation.
pub struct OutcomeHandlers {
    succeeded: Builder<Value>,
    failed: Builder<String>,
}

impl OutcomeHandlers {
    pub fn new<S, F>(succeeded: S, failed: F) -> Self
    where
        S: Fn(Value) -> Notification + Send + Sync + 'static,
        F: Fn(String) -> Notification + Send + Sync + 'static,
    {
        Self {
            succeeded: Box::new(succeeded),
            failed: Box::new(failed),
        }
    }

    /// Handlers for an operation of `kind` on record `id`.
    ///
    /// Loads have no single target, so their creators are used as-is.
    pub fn for_kind(kind: ActionKind, id: Option<RecordId>, creators: &ActionCreators) -> Self {
        match kind {
            ActionKind::Update => Self::new(
                handle_update_success(id.clone(), creators.clone()),
                handle_update_failed(id, creators.clone()),
            ),
            ActionKind::Delete => Self::new(
                handle_delete_success(id.clone(), creators.clone()),
                handle_delete_failed(id, creators.clone()),
            ),
            ActionKind::Load => {
                let on_success = creators.clone();
                let on_failure = creators.clone();
                Self::new(
                    move |payload| on_success.load_succeeded(payload),
                    move |error| on_failure.load_failed(error),
                )
            }
        }
    }

    pub fn succeeded(&self, payload: Value) -> Notification {
        (self.succeeded)(payload)
    }

    pub fn failed(&self, error: impl Into<String>) -> Notification {
        (self.failed)(error.into())
    }
}

impl std::fmt::Debug for OutcomeHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeHandlers").finish_non_exhaustive()
    }
}
