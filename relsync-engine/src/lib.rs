//! Relation-aware synchronization engine for relsync.
//!
//! Sits between an application's state store and its remote API. Given an
//! action asking for entities to be loaded, saved or deleted, the engine:
//!
//! 1. **Resolves** the order in which entity types must sync so that every
//!    type runs after the types it references ([`DependencyGraph`])
//! 2. **Schedules** the resulting levels one after another, running each
//!    level's operations concurrently ([`Scheduler`])
//! 3. **Invokes** the remote endpoint for each operation ([`Invoker`])
//! 4. **Notifies** the store of every outcome ([`OutcomeHandlers`])
//!
//! Identifiers the remote API assigns to parents are substituted into their
//! dependents' payloads before the dependents are sent.
//!
//! The store is reached only through [`StateStore`] and
//! [`NotificationSink`]; [`store::memory::MemoryStore`] implements both.
//!
//! # Example
//!
//! ```
//! use relsync_engine::store::memory::MemoryStore;
//! use relsync_engine::{SyncConfig, SyncInterceptor};
//! use relsync_model::EndpointRegistry;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let interceptor = SyncInterceptor::new(
//!     store.clone(),
//!     store,
//!     EndpointRegistry::new(),
//!     SyncConfig::default(),
//! );
//! assert!(interceptor.validate().is_ok());
//! ```

mod config;
mod error;
mod graph;
mod interceptor;
mod invoker;
mod notifier;
mod operation;
mod scheduler;
pub mod store;

pub use config::{DEFAULT_OPERATION_TIMEOUT_MS, DEFAULT_STORE_KEY, SyncConfig};
pub use error::{ErrorCategory, SyncError, SyncResult};
pub use graph::{DependencyGraph, resolve};
pub use interceptor::{StoreAction, SyncInterceptor};
pub use invoker::Invoker;
pub use notifier::{
    OutcomeHandlers, handle_delete_failed, handle_delete_success, handle_update_failed,
    handle_update_success,
};
pub use operation::{Operation, OperationGroup, OperationSet, SyncLevel};
pub use scheduler::{OperationOutcome, Scheduler, SyncReport};
pub use store::{NotificationSink, StateStore};
