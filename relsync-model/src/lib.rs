//! Entity model for relsync.
//!
//! Defines what the engine needs to know about each entity type:
//! - [`EntitySchema`]: record-identifier field and declared relations
//! - [`SchemaRegistry`]: every known entity type, in registration order
//! - [`EndpointTable`]: the remote load/update/delete functions for a type
//! - [`EndpointRegistry`]: endpoint tables keyed by entity type
//!
//! Relations are named foreign-key references (`"owner" -> "users"`); the
//! engine uses them to order synchronization and to substitute identifiers
//! the remote API assigned to parents.

mod endpoint;
mod schema;

pub use endpoint::{
    EndpointFn, EndpointFuture, EndpointRegistry, EndpointReply, EndpointTable, RemoteError,
};
pub use schema::{DEFAULT_RECORD_KEY, EntitySchema, RelationMap, SchemaRegistry};

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("entity type registered twice: {0}")]
    DuplicateEntityType(relsync_types::DataKey),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(relsync_types::DataKey),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
