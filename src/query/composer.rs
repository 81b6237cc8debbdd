//! Query Composer - association lookups into composed join plans
//!
//! The composer walks the full through chain at resolution time and emits a
//! single joined plan. Intermediate rows are never fetched with separate
//! per-row queries.

use std::sync::Arc;

use crate::associations::catalog::AssociationCatalog;
use crate::associations::metadata::AssociationKind;
use crate::error::{AssocResult, OrmError};
use crate::instance::EntityInstance;
use crate::query::plan::{JoinStep, PlanFilter, QueryPlan, ResultShape};
use crate::schema::SchemaRegistry;

/// Translates (instance, association name) into a query plan
#[derive(Debug)]
pub struct QueryComposer {
    schema: Arc<SchemaRegistry>,
    catalog: Arc<AssociationCatalog>,
}

impl QueryComposer {
    /// Create a composer over a schema registry and association catalog
    pub fn new(schema: Arc<SchemaRegistry>, catalog: Arc<AssociationCatalog>) -> Self {
        Self { schema, catalog }
    }

    /// Build the plan for resolving `association` from `instance`.
    ///
    /// The plan starts at the owning instance's row (primary-key equality
    /// filter) and joins one hop per direct association in the expanded
    /// chain. Collection results keep the storage engine's natural row
    /// order; no implicit sort is imposed here.
    pub fn build_plan(
        &self,
        instance: &EntityInstance,
        association: &str,
    ) -> AssocResult<QueryPlan> {
        let owner = self.schema.lookup(instance.entity())?;
        let metadata = self.catalog.resolve(instance.entity(), association)?;
        let primary_key = instance.primary_key(&owner)?.clone();

        let hops = self.catalog.expand_chain(instance.entity(), association)?;

        let mut joins = Vec::with_capacity(hops.len());
        let mut current = owner.clone();
        for hop in &hops {
            let target = self.schema.lookup(&hop.target)?;
            let step = match hop.kind {
                AssociationKind::BelongsTo => JoinStep {
                    source_field: hop.effective_foreign_key(),
                    target_entity: target.name.clone(),
                    target_field: target.primary_key.clone(),
                },
                AssociationKind::HasMany => JoinStep {
                    source_field: current.primary_key.clone(),
                    target_entity: target.name.clone(),
                    target_field: hop.effective_foreign_key(),
                },
                // expand_chain flattens through declarations into direct hops
                AssociationKind::HasManyThrough => {
                    return Err(OrmError::UnresolvableThroughChain {
                        entity: metadata.owner.clone(),
                        association: metadata.name.clone(),
                        target: metadata.target.clone(),
                        reason: "chain expansion returned a non-direct hop".to_string(),
                    });
                }
            };
            joins.push(step);
            current = target;
        }

        let plan = QueryPlan {
            root_entity: owner.name.clone(),
            filter: PlanFilter {
                entity: owner.name,
                field: owner.primary_key,
                value: primary_key,
            },
            joins,
            shape: if metadata.kind.is_collection() {
                ResultShape::Many
            } else {
                ResultShape::One
            },
            distinct: metadata.kind.is_through(),
        };

        tracing::debug!(
            "Composed plan for '{}' on '{}': {} join step(s), shape {:?}",
            association,
            instance.entity(),
            plan.joins.len(),
            plan.shape
        );

        Ok(plan)
    }
}
