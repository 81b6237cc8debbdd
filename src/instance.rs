//! Entity instances materialized from storage rows

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AssocResult, OrmError};
use crate::schema::EntityDefinition;

/// A single materialized row of an entity type.
///
/// Instances are created by the caller or materialized by an execution
/// adapter. Identity for caching purposes is the pair of entity name and
/// canonical primary key string; reassigning fields on an instance should be
/// followed by a cache invalidation through the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInstance {
    entity: String,
    fields: HashMap<String, Value>,
}

impl EntityInstance {
    /// Create an instance from an entity name and field values
    pub fn new(entity: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        Self {
            entity: entity.into(),
            fields,
        }
    }

    /// The entity type name this instance belongs to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a field value, returning the previous one if present
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// All field values
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Primary key value according to the entity definition
    pub fn primary_key(&self, definition: &EntityDefinition) -> AssocResult<&Value> {
        self.fields
            .get(&definition.primary_key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| OrmError::MissingPrimaryKey {
                entity: self.entity.clone(),
                field: definition.primary_key.clone(),
            })
    }

    /// Canonical identity string used as the cache key component for this
    /// instance
    pub fn identity_key(&self, definition: &EntityDefinition) -> AssocResult<String> {
        Ok(canonical_key(self.primary_key(definition)?))
    }
}

/// Canonical string form of a key value: bare string content for strings,
/// JSON text otherwise
pub fn canonical_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
