//! Operations and operation sets.

use relsync_model::RelationMap;
use relsync_types::{DataKey, RecordId};
use serde_json::Value;

/// One pending synchronization unit. Consumed once by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub data_key: DataKey,
    /// Record-identifier field of the type.
    pub record_key: String,
    /// Target record; absent for loads.
    pub id: Option<RecordId>,
    /// Forces a load with this payload, whatever the store has queued.
    pub load_payload: Option<Value>,
    pub relations: RelationMap,
}

impl Operation {
    /// Syncs whatever the store has queued for `id`.
    pub fn sync(
        data_key: impl Into<DataKey>,
        record_key: impl Into<String>,
        id: Option<RecordId>,
    ) -> Self {
        Self {
            data_key: data_key.into(),
            record_key: record_key.into(),
            id,
            load_payload: None,
            relations: RelationMap::new(),
        }
    }

    /// Loads with a caller-supplied payload.
    pub fn load(
        data_key: impl Into<DataKey>,
        record_key: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            data_key: data_key.into(),
            record_key: record_key.into(),
            id: None,
            load_payload: Some(payload),
            relations: RelationMap::new(),
        }
    }

    #[must_use]
    pub fn with_relations(mut self, relations: RelationMap) -> Self {
        self.relations = relations;
        self
    }
}

/// The operations of one entity type plus the type's relations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationGroup {
    pub operations: Vec<Operation>,
    pub relations: RelationMap,
}

/// Entity type → operation group, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSet {
    groups: Vec<(DataKey, OperationGroup)>,
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation to its type's group, registering the group
    /// (with the operation's relations) on first use.
    pub fn push(&mut self, operation: Operation) {
        let group = self.group_mut(&operation.data_key, &operation.relations);
        group.operations.push(operation);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, operation: Operation) -> Self {
        self.push(operation);
        self
    }

    /// Registers a type with no operations yet.
    pub fn declare(&mut self, data_key: impl Into<DataKey>, relations: RelationMap) {
        let data_key = data_key.into();
        self.group_mut(&data_key, &relations);
    }

    pub fn get(&self, data_key: &DataKey) -> Option<&OperationGroup> {
        self.groups
            .iter()
            .find(|(key, _)| key == data_key)
            .map(|(_, group)| group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataKey, &OperationGroup)> {
        self.groups.iter().map(|(key, group)| (key, group))
    }

    pub fn data_keys(&self) -> impl Iterator<Item = &DataKey> {
        self.groups.iter().map(|(key, _)| key)
    }

    /// Number of entity types.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of operations over all types.
    pub fn operation_count(&self) -> usize {
        self.groups.iter().map(|(_, g)| g.operations.len()).sum()
    }

    fn group_mut(&mut self, data_key: &DataKey, relations: &RelationMap) -> &mut OperationGroup {
        let pos = match self.groups.iter().position(|(key, _)| key == data_key) {
            Some(pos) => pos,
            None => {
                self.groups.push((
                    data_key.clone(),
                    OperationGroup {
                        operations: Vec::new(),
                        relations: relations.clone(),
                    },
                ));
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos].1
    }
}

/// One barrier step of the execution plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncLevel {
    /// Entity types in this level, in resolution order.
    pub data_keys: Vec<DataKey>,
    pub operations: Vec<Operation>,
}
