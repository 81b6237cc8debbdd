//! In-memory execution adapter
//!
//! Reference adapter backing the crate's tests and small tools. Rows live
//! in per-entity vectors, so the "natural row order" handed back from a
//! plan walk is insertion order.

use dashmap::DashMap;

use crate::backends::{ExecutionAdapter, Row};
use crate::error::{AssocResult, OrmError};
use crate::instance::EntityInstance;
use crate::query::plan::QueryPlan;
use crate::schema::EntityDefinition;

/// Seedable in-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: DashMap<String, Vec<Row>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to an entity's table, creating the table on first use
    pub fn insert(&self, entity: &str, row: Row) {
        self.tables.entry(entity.to_string()).or_default().push(row);
    }

    /// Snapshot of an entity's rows in insertion order
    pub fn rows(&self, entity: &str) -> Vec<Row> {
        self.tables
            .get(entity)
            .map(|table| table.clone())
            .unwrap_or_default()
    }

    /// Remove all rows for an entity
    pub fn truncate(&self, entity: &str) {
        self.tables.remove(entity);
    }
}

impl ExecutionAdapter for MemoryBackend {
    fn execute(&self, plan: &QueryPlan) -> AssocResult<Vec<Row>> {
        // Root row set: the originating instance's row by primary key
        let mut current: Vec<Row> = self
            .rows(&plan.filter.entity)
            .into_iter()
            .filter(|row| row.get(&plan.filter.field) == Some(&plan.filter.value))
            .collect();

        for step in &plan.joins {
            let keys: Vec<serde_json::Value> = current
                .iter()
                .filter_map(|row| row.get(&step.source_field))
                .filter(|value| !value.is_null())
                .cloned()
                .collect();

            current = self
                .rows(&step.target_entity)
                .into_iter()
                .filter(|row| {
                    row.get(&step.target_field)
                        .map(|value| keys.contains(value))
                        .unwrap_or(false)
                })
                .collect();

            if current.is_empty() {
                break;
            }
        }

        Ok(current)
    }

    fn materialize(&self, definition: &EntityDefinition, row: Row) -> AssocResult<EntityInstance> {
        if !row.contains_key(&definition.primary_key) {
            return Err(OrmError::Execution(format!(
                "row for '{}' has no primary key field '{}'",
                definition.name, definition.primary_key
            )));
        }
        Ok(EntityInstance::new(definition.name.clone(), row))
    }
}
