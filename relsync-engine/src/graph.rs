//! Dependency resolver.
//!
//! Entity types form a graph through their relations. Resolution is a
//! depth-first post-order walk keeping the current ancestor chain: reaching
//! a type that is already on the chain is a cycle, reaching one that was
//! completed earlier is a no-op. Types then group into levels by depth so
//! independent types share a level.

use crate::error::{SyncError, SyncResult};
use crate::operation::{OperationSet, SyncLevel};
use relsync_model::{RelationMap, SchemaRegistry};
use relsync_types::DataKey;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Explicit adjacency between entity types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<DataKey>,
    edges: HashMap<DataKey, RelationMap>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type with its relations. Re-adding a type replaces its relations
    /// but keeps its original position.
    pub fn add_node(&mut self, data_key: impl Into<DataKey>, relations: RelationMap) {
        let data_key = data_key.into();
        if !self.edges.contains_key(&data_key) {
            self.nodes.push(data_key.clone());
        }
        self.edges.insert(data_key, relations);
    }

    /// Graph over every registered schema.
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let mut graph = Self::new();
        for schema in registry.iter() {
            graph.add_node(schema.data_key.clone(), schema.relations.clone());
        }
        graph
    }

    /// Graph over the types of one operation set.
    pub fn from_operation_set(set: &OperationSet) -> Self {
        let mut graph = Self::new();
        for (data_key, group) in set.iter() {
            graph.add_node(data_key.clone(), group.relations.clone());
        }
        graph
    }

    pub fn contains(&self, data_key: &DataKey) -> bool {
        self.edges.contains_key(data_key)
    }

    pub fn nodes(&self) -> &[DataKey] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct dependencies of a type that are themselves nodes.
    pub fn dependencies(&self, data_key: &DataKey) -> Vec<&DataKey> {
        let mut deps: Vec<&DataKey> = Vec::new();
        if let Some(relations) = self.edges.get(data_key) {
            for target in relations.values() {
                if self.contains(target) && !deps.contains(&target) {
                    deps.push(target);
                }
            }
        }
        deps
    }

    /// Every node after all the nodes it depends on. Ties keep
    /// registration order.
    pub fn topological_order(&self) -> SyncResult<Vec<DataKey>> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut done = HashSet::new();
        let mut chain = Vec::new();
        for data_key in &self.nodes {
            self.visit(data_key, &mut chain, &mut done, &mut order)?;
        }
        Ok(order.into_iter().cloned().collect())
    }

    fn visit<'g>(
        &'g self,
        data_key: &'g DataKey,
        chain: &mut Vec<&'g DataKey>,
        done: &mut HashSet<&'g DataKey>,
        order: &mut Vec<&'g DataKey>,
    ) -> SyncResult<()> {
        if done.contains(data_key) {
            return Ok(());
        }
        chain.push(data_key);
        if let Some(relations) = self.edges.get(data_key) {
            for (property, target) in relations {
                if chain.contains(&target) {
                    return Err(SyncError::CircularDependency {
                        target: target.clone(),
                        property: property.clone(),
                        dependent: data_key.clone(),
                        chain: chain.iter().map(|k| (*k).clone()).collect(),
                    });
                }
                self.visit(target, chain, done, order)?;
            }
        }
        chain.pop();
        done.insert(data_key);
        // Referenced types outside the graph contribute nothing.
        if self.contains(data_key) {
            order.push(data_key);
        }
        Ok(())
    }

    /// Nodes grouped by depth: a node with no dependencies has depth 0,
    /// any other node sits one past its deepest dependency.
    pub fn levels(&self) -> SyncResult<Vec<Vec<DataKey>>> {
        let order = self.topological_order()?;
        let mut depths: HashMap<&DataKey, usize> = HashMap::with_capacity(order.len());
        let mut levels: Vec<Vec<DataKey>> = Vec::new();
        for data_key in &order {
            let depth = self
                .dependencies(data_key)
                .into_iter()
                .filter_map(|dep| depths.get(dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depths.insert(data_key, depth);
            if levels.len() <= depth {
                levels.resize_with(depth + 1, Vec::new);
            }
            levels[depth].push(data_key.clone());
        }
        Ok(levels)
    }

    /// Fails with [`SyncError::CircularDependency`] if the graph has a cycle.
    pub fn validate(&self) -> SyncResult<()> {
        self.topological_order().map(|_| ())
    }
}

/// Orders an operation set into sync levels.
///
/// Declared types with no operations still take part in ordering and cycle
/// detection but never show up in a level; levels left empty are dropped.
pub fn resolve(set: &OperationSet) -> SyncResult<Vec<SyncLevel>> {
    let graph = DependencyGraph::from_operation_set(set);
    let levels: Vec<SyncLevel> = graph
        .levels()?
        .into_iter()
        .filter_map(|data_keys| {
            let data_keys: Vec<DataKey> = data_keys
                .into_iter()
                .filter(|key| set.get(key).is_some_and(|g| !g.operations.is_empty()))
                .collect();
            if data_keys.is_empty() {
                return None;
            }
            let operations = data_keys
                .iter()
                .filter_map(|key| set.get(key))
                .flat_map(|group| group.operations.iter().cloned())
                .collect();
            Some(SyncLevel {
                data_keys,
                operations,
            })
        })
        .collect();
    debug!(types = graph.len(), levels = levels.len(), "resolved operation set");
    Ok(levels)
}
