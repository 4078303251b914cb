//! Synchronization kinds and the action-type vocabulary.
//!
//! Trigger actions are strings shaped `@@relsync/<dataKey>/<SUFFIX>`; the bare
//! `@@relsync/SYNC_ALL` syncs every entity type at once.

use crate::DataKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every action type relsync reacts to or dispatches.
pub const ACTION_PREFIX: &str = "@@relsync/";

/// The remote operation a pending sync resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Fetch records from the remote API.
    Load,
    /// Create or update a record (creates are updates of `NEW` entities).
    Update,
    /// Delete a record.
    Delete,
}

impl ActionKind {
    /// Every kind, in endpoint-table order.
    pub const ALL: [ActionKind; 3] = [ActionKind::Load, ActionKind::Update, ActionKind::Delete];

    /// Name of the endpoint slot serving this kind.
    #[must_use]
    pub const fn method_name(&self) -> &'static str {
        match self {
            ActionKind::Load => "load",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Load => "LOAD",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
        })
    }
}

/// What an incoming action asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    /// Sync one entity instance that was created or modified.
    UpdateSync,
    /// Sync one entity instance that was deleted.
    DeleteSync,
    /// Load records; the action payload is handed to the endpoint as-is.
    Load,
    /// Sync every pending queued action of the entity type.
    SyncAll,
}

impl Trigger {
    /// The action-type suffix for this trigger.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Trigger::UpdateSync => "UPDATE_SYNC",
            Trigger::DeleteSync => "DELETE_SYNC",
            Trigger::Load => "LOAD",
            Trigger::SyncAll => "SYNC_ALL",
        }
    }

    /// Looks a trigger up by its suffix.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "UPDATE_SYNC" => Some(Trigger::UpdateSync),
            "DELETE_SYNC" => Some(Trigger::DeleteSync),
            "LOAD" => Some(Trigger::Load),
            "SYNC_ALL" => Some(Trigger::SyncAll),
            _ => None,
        }
    }
}

/// A classified trigger action type.
///
/// `data_key` is `None` only for the global `SYNC_ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionType {
    pub data_key: Option<DataKey>,
    pub trigger: Trigger,
}

impl ActionType {
    /// Creates an action type scoped to one entity type.
    pub fn new(data_key: impl Into<DataKey>, trigger: Trigger) -> Self {
        Self {
            data_key: Some(data_key.into()),
            trigger,
        }
    }

    /// The action type that syncs every entity type.
    #[must_use]
    pub fn global_sync() -> Self {
        Self {
            data_key: None,
            trigger: Trigger::SyncAll,
        }
    }

    /// Classifies an action-type string.
    ///
    /// Returns `None` for types outside the relsync vocabulary, which callers
    /// are expected to let pass untouched.
    #[must_use]
    pub fn parse(action_type: &str) -> Option<Self> {
        let rest = action_type.strip_prefix(ACTION_PREFIX)?;
        if rest == Trigger::SyncAll.suffix() {
            return Some(Self::global_sync());
        }
        let (data_key, suffix) = rest.rsplit_once('/')?;
        if data_key.is_empty() {
            return None;
        }
        let trigger = Trigger::from_suffix(suffix)?;
        Some(Self::new(data_key, trigger))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data_key {
            Some(key) => write!(f, "{ACTION_PREFIX}{key}/{}", self.trigger.suffix()),
            None => write!(f, "{ACTION_PREFIX}{}", self.trigger.suffix()),
        }
    }
}

impl FromStr for ActionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::InvalidActionType(s.to_string()))
    }
}
