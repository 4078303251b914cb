use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default store key under which the store keeps relsync state.
pub const DEFAULT_STORE_KEY: &str = "relsync";

/// Default per-operation deadline (ms).
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 30_000;

fn default_store_key() -> String {
    DEFAULT_STORE_KEY.to_string()
}

fn default_operation_timeout_ms() -> Option<u64> {
    Some(DEFAULT_OPERATION_TIMEOUT_MS)
}

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Key under which the store keeps relsync state.
    #[serde(default = "default_store_key")]
    pub store_key: String,
    /// Deadline for each remote call (ms). `None` waits forever.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: Option<u64>,
    /// Skip operations whose related type failed earlier in the same pass.
    #[serde(default)]
    pub abort_on_parent_failure: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store_key: default_store_key(),
            operation_timeout_ms: default_operation_timeout_ms(),
            abort_on_parent_failure: false,
        }
    }
}

impl SyncConfig {
    pub fn with_store_key(mut self, store_key: impl Into<String>) -> Self {
        self.store_key = store_key.into();
        self
    }

    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_abort_on_parent_failure(mut self, abort: bool) -> Self {
        self.abort_on_parent_failure = abort;
        self
    }

    /// The per-operation deadline, if any.
    #[must_use]
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}
