//! Endpoint invoker.
//!
//! Every irregularity of a remote call (missing method, plain-value reply,
//! synchronous raise, async rejection, deadline) goes through the same
//! funnel: dispatch a failure notification, then hand the same error back to
//! the caller.

use crate::error::{SyncError, SyncResult};
use crate::notifier::OutcomeHandlers;
use crate::store::NotificationSink;
use relsync_model::{EndpointReply, EndpointTable};
use relsync_types::{ActionKind, DataKey};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Calls endpoint functions and reports their outcome.
#[derive(Clone)]
pub struct Invoker {
    sink: Arc<dyn NotificationSink>,
    timeout: Option<Duration>,
}

impl Invoker {
    pub fn new(sink: Arc<dyn NotificationSink>, timeout: Option<Duration>) -> Self {
        Self { sink, timeout }
    }

    /// Invokes `table[kind]` with `payload`.
    ///
    /// A missing table behaves like a table with every slot empty.
    pub async fn invoke(
        &self,
        data_key: &DataKey,
        table: Option<&EndpointTable>,
        kind: ActionKind,
        payload: Value,
        handlers: &OutcomeHandlers,
    ) -> SyncResult<Value> {
        let Some(endpoint) = table.and_then(|t| t.get(kind)) else {
            return Err(self.fail(data_key, handlers, SyncError::MethodNotImplemented { kind }));
        };

        debug!(%data_key, %kind, "invoking endpoint");
        let future = match endpoint(payload) {
            Ok(EndpointReply::Pending(future)) => future,
            Ok(EndpointReply::Ready(_)) => {
                return Err(self.fail(
                    data_key,
                    handlers,
                    SyncError::InvalidMethodImplementation { kind },
                ));
            }
            Err(raised) => return Err(self.fail(data_key, handlers, raised.into())),
        };

        let settled = match self.timeout {
            Some(after) => match tokio::time::timeout(after, future).await {
                Ok(result) => result.map_err(SyncError::from),
                Err(_) => Err(SyncError::Timeout {
                    data_key: data_key.clone(),
                    kind,
                    after,
                }),
            },
            None => future.await.map_err(SyncError::from),
        };

        match settled {
            Ok(value) => {
                debug!(%data_key, %kind, "endpoint resolved");
                self.sink.dispatch(handlers.succeeded(value.clone()));
                Ok(value)
            }
            Err(err) => Err(self.fail(data_key, handlers, err)),
        }
    }

    fn fail(&self, data_key: &DataKey, handlers: &OutcomeHandlers, err: SyncError) -> SyncError {
        warn!(%data_key, error = %err, "operation failed");
        self.sink.dispatch(handlers.failed(err.to_string()));
        err
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
