//! Schema Registry - entity definitions and primary keys
//!
//! The registry is the leaf dependency for everything else in the crate:
//! the association catalog validates declaration targets against it and the
//! query composer uses it to find primary key fields. It is populated during
//! a build phase and read-mostly afterwards, so it can be shared across
//! threads behind an `Arc` without external locking.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AssocResult, OrmError};

/// Definition of an entity type: its name, primary key field, and the set
/// of declared fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Entity type name, unique within a registry
    pub name: String,

    /// Primary key field name (defaults to "id")
    pub primary_key: String,

    /// Declared non-key fields
    pub fields: Vec<String>,
}

impl EntityDefinition {
    /// Create a definition with the default "id" primary key and no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: "id".to_string(),
            fields: Vec::new(),
        }
    }

    /// Set the primary key field name
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Set the declared fields
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Check whether the entity declares a field (the primary key counts)
    pub fn has_field(&self, field: &str) -> bool {
        self.primary_key == field || self.fields.iter().any(|f| f == field)
    }

    /// Conventional foreign key column referencing this entity, e.g.
    /// `game_id` for an entity named `Game`
    pub fn default_foreign_key(&self) -> String {
        format!("{}_id", self.name.to_lowercase())
    }
}

/// Thread-safe registry of entity definitions
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: DashMap<String, EntityDefinition>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
        }
    }

    /// Register an entity definition.
    ///
    /// Fails with `DuplicateEntity` if an entity with the same name is
    /// already registered; existing definitions are never replaced.
    pub fn register(&self, definition: EntityDefinition) -> AssocResult<()> {
        match self.entities.entry(definition.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(OrmError::DuplicateEntity(definition.name))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::debug!("Registered entity '{}'", definition.name);
                slot.insert(definition);
                Ok(())
            }
        }
    }

    /// Look up an entity definition by name
    pub fn lookup(&self, name: &str) -> AssocResult<EntityDefinition> {
        self.entities
            .get(name)
            .map(|entry| entry.clone())
            .ok_or_else(|| OrmError::UnknownEntity(name.to_string()))
    }

    /// Check whether an entity is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Names of all registered entities
    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
