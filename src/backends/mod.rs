//! Execution adapter boundary
//!
//! All storage I/O crosses this seam: the core hands a consumed-once query
//! plan to an adapter and gets rows back, then asks the adapter to
//! materialize each row into an entity instance. The core never issues raw
//! storage commands and does not specify the engine's query language.
//! Failure and timeout semantics behind the seam belong to the adapter; the
//! core sees a single failure outcome.

pub mod memory;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::AssocResult;
use crate::instance::EntityInstance;
use crate::query::plan::QueryPlan;
use crate::schema::EntityDefinition;

pub use memory::MemoryBackend;

/// A raw storage row: field name to value
pub type Row = HashMap<String, Value>;

/// Storage engine seam consumed by the resolver
pub trait ExecutionAdapter: Send + Sync {
    /// Execute a query plan, returning matching rows of the plan's target
    /// entity in the engine's natural row order
    fn execute(&self, plan: &QueryPlan) -> AssocResult<Vec<Row>>;

    /// Materialize a raw row into an entity instance
    fn materialize(&self, definition: &EntityDefinition, row: Row) -> AssocResult<EntityInstance>;
}
