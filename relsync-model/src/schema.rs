use crate::{ModelError, ModelResult};
use relsync_types::DataKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Record-identifier field used when a schema does not name one.
pub const DEFAULT_RECORD_KEY: &str = "id";

/// Relation property name → related entity type.
pub type RelationMap = BTreeMap<String, DataKey>;

fn default_record_key() -> String {
    DEFAULT_RECORD_KEY.to_string()
}

/// Describes one synchronizable entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub data_key: DataKey,
    /// Field of the record holding its identifier.
    #[serde(default = "default_record_key")]
    pub record_key: String,
    /// Foreign-key properties and the entity types they point at.
    #[serde(default)]
    pub relations: RelationMap,
}

impl EntitySchema {
    /// A schema with the default record key and no relations.
    pub fn new(data_key: impl Into<DataKey>) -> Self {
        Self {
            data_key: data_key.into(),
            record_key: default_record_key(),
            relations: RelationMap::new(),
        }
    }

    /// Sets the record-identifier field.
    pub fn with_record_key(mut self, record_key: impl Into<String>) -> Self {
        self.record_key = record_key.into();
        self
    }

    /// Declares that `property` references a record of `target`.
    pub fn with_relation(
        mut self,
        property: impl Into<String>,
        target: impl Into<DataKey>,
    ) -> Self {
        self.relations.insert(property.into(), target.into());
        self
    }

    /// Distinct entity types this type depends on, in property order.
    pub fn dependencies(&self) -> Vec<&DataKey> {
        let mut deps: Vec<&DataKey> = Vec::with_capacity(self.relations.len());
        for target in self.relations.values() {
            if !deps.contains(&target) {
                deps.push(target);
            }
        }
        deps
    }
}

/// Every known entity type, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EntitySchema>", into = "Vec<EntitySchema>")]
pub struct SchemaRegistry {
    schemas: Vec<EntitySchema>,
    index: HashMap<DataKey, usize>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema. Each entity type may be registered once.
    pub fn register(&mut self, schema: EntitySchema) -> ModelResult<()> {
        if self.index.contains_key(&schema.data_key) {
            return Err(ModelError::DuplicateEntityType(schema.data_key));
        }
        self.index.insert(schema.data_key.clone(), self.schemas.len());
        self.schemas.push(schema);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, schema: EntitySchema) -> ModelResult<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Parses a registry from a JSON array of schemas.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, data_key: &DataKey) -> Option<&EntitySchema> {
        self.index.get(data_key).map(|&i| &self.schemas[i])
    }

    /// Like [`get`](Self::get), but unknown types are an error.
    pub fn schema(&self, data_key: &DataKey) -> ModelResult<&EntitySchema> {
        self.get(data_key)
            .ok_or_else(|| ModelError::UnknownEntityType(data_key.clone()))
    }

    /// Record-identifier field for a type; unknown types use the default.
    pub fn record_key(&self, data_key: &DataKey) -> &str {
        self.get(data_key)
            .map_or(DEFAULT_RECORD_KEY, |s| s.record_key.as_str())
    }

    /// Declared relations for a type; unknown types have none.
    pub fn relations(&self, data_key: &DataKey) -> RelationMap {
        self.get(data_key)
            .map(|s| s.relations.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, data_key: &DataKey) -> bool {
        self.index.contains_key(data_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.iter()
    }

    pub fn data_keys(&self) -> impl Iterator<Item = &DataKey> {
        self.schemas.iter().map(|s| &s.data_key)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Relations whose target type is not registered, as
    /// `(dependent, property, target)`.
    pub fn dangling_relations(&self) -> Vec<(&DataKey, &str, &DataKey)> {
        self.schemas
            .iter()
            .flat_map(|schema| {
                schema
                    .relations
                    .iter()
                    .filter(|(_, target)| !self.contains(target))
                    .map(move |(prop, target)| (&schema.data_key, prop.as_str(), target))
            })
            .collect()
    }
}

impl TryFrom<Vec<EntitySchema>> for SchemaRegistry {
    type Error = ModelError;

    fn try_from(schemas: Vec<EntitySchema>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }
}

impl From<SchemaRegistry> for Vec<EntitySchema> {
    fn from(registry: SchemaRegistry) -> Self {
        registry.schemas
    }
}
