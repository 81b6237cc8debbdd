//! Query plans: ordered join steps plus a terminal filter
//!
//! A plan represents exactly one resolution request. It is produced fresh
//! by the composer, handed to the execution adapter once, and discarded.
//! Plans hold no external resources, so abandoning one requires no cleanup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a plan yields at most one row or a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultShape {
    /// At most one row (belongs-to)
    One,
    /// Zero or more rows, in the storage engine's natural row order
    Many,
}

/// One join hop: match rows of `target_entity` whose `target_field` equals
/// the current row set's `source_field` values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinStep {
    pub source_field: String,
    pub target_entity: String,
    pub target_field: String,
}

/// Terminal filter: primary-key equality on the originating instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFilter {
    pub entity: String,
    pub field: String,
    pub value: Value,
}

/// A composed query plan, consumed once by the execution adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Entity the walk starts from (the owning instance's type)
    pub root_entity: String,

    /// Primary-key filter selecting the originating instance's row
    pub filter: PlanFilter,

    /// Ordered join steps from the root down to the target entity
    pub joins: Vec<JoinStep>,

    /// Expected result shape
    pub shape: ResultShape,

    /// Deduplicate results by target primary key, preserving first-seen
    /// order (set for through associations, which can otherwise produce
    /// duplicate target rows)
    pub distinct: bool,
}

impl QueryPlan {
    /// The entity the plan ultimately yields rows of
    pub fn target_entity(&self) -> &str {
        self.joins
            .last()
            .map(|step| step.target_entity.as_str())
            .unwrap_or(&self.root_entity)
    }
}
