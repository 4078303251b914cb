//! Remote endpoint contracts.
//!
//! Each entity type owns up to three remote functions. A function receives the
//! outgoing JSON payload and must hand back a pending future; it may also fail
//! synchronously. An already-computed value is representable too; the
//! invoker rejects it as a contract violation.

use futures::future::BoxFuture;
use relsync_types::{ActionKind, DataKey};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Failure reported by a remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for RemoteError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for RemoteError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// The deferred result of a remote call.
pub type EndpointFuture = BoxFuture<'static, Result<Value, RemoteError>>;

/// What an endpoint function hands back when called.
pub enum EndpointReply {
    /// A deferred result; the only valid reply.
    Pending(EndpointFuture),
    /// A plain value. Endpoints must be asynchronous, so this is rejected.
    Ready(Value),
}

impl EndpointReply {
    /// Wraps a future as a pending reply.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, RemoteError>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }
}

impl fmt::Debug for EndpointReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(_) => f.write_str("Pending(..)"),
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
        }
    }
}

/// One remote function. `Err` means the call failed before producing a reply.
pub type EndpointFn = Arc<dyn Fn(Value) -> Result<EndpointReply, RemoteError> + Send + Sync>;

/// The load/update/delete functions of one entity type. Any slot may be empty.
#[derive(Clone, Default)]
pub struct EndpointTable {
    load: Option<EndpointFn>,
    update: Option<EndpointFn>,
    delete: Option<EndpointFn>,
}

impl EndpointTable {
    /// A table with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the slot for `kind` with a raw endpoint function.
    pub fn with_endpoint<F>(mut self, kind: ActionKind, endpoint: F) -> Self
    where
        F: Fn(Value) -> Result<EndpointReply, RemoteError> + Send + Sync + 'static,
    {
        *self.slot_mut(kind) = Some(Arc::new(endpoint));
        self
    }

    /// Fills the slot for `kind` with an async function.
    pub fn with_async<F, Fut>(self, kind: ActionKind, endpoint: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RemoteError>> + Send + 'static,
    {
        self.with_endpoint(kind, move |payload| Ok(EndpointReply::pending(endpoint(payload))))
    }

    /// The function serving `kind`, if implemented.
    pub fn get(&self, kind: ActionKind) -> Option<&EndpointFn> {
        match kind {
            ActionKind::Load => self.load.as_ref(),
            ActionKind::Update => self.update.as_ref(),
            ActionKind::Delete => self.delete.as_ref(),
        }
    }

    pub fn implements(&self, kind: ActionKind) -> bool {
        self.get(kind).is_some()
    }

    fn slot_mut(&mut self, kind: ActionKind) -> &mut Option<EndpointFn> {
        match kind {
            ActionKind::Load => &mut self.load,
            ActionKind::Update => &mut self.update,
            ActionKind::Delete => &mut self.delete,
        }
    }
}

impl fmt::Debug for EndpointTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointTable")
            .field("load", &self.load.is_some())
            .field("update", &self.update.is_some())
            .field("delete", &self.delete.is_some())
            .finish()
    }
}

/// Endpoint tables keyed by entity type.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    tables: HashMap<DataKey, EndpointTable>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the table for an entity type.
    pub fn register(&mut self, data_key: impl Into<DataKey>, table: EndpointTable) {
        self.tables.insert(data_key.into(), table);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, data_key: impl Into<DataKey>, table: EndpointTable) -> Self {
        self.register(data_key, table);
        self
    }

    pub fn get(&self, data_key: &DataKey) -> Option<&EndpointTable> {
        self.tables.get(data_key)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
