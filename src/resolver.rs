//! Association Resolver - the single polymorphic resolution entry point
//!
//! Instead of generating a per-relationship accessor method for every
//! declaration, resolution goes through one lookup dispatched on the
//! association kind: `resolver.resolve(&instance, "users")`. Results are
//! memoized per (instance, association) until invalidated.

use std::collections::HashSet;
use std::sync::Arc;

use crate::associations::cache::{AssociationCache, CacheStats};
use crate::associations::catalog::AssociationCatalog;
use crate::backends::ExecutionAdapter;
use crate::error::{AssocResult, OrmError};
use crate::instance::{canonical_key, EntityInstance};
use crate::query::composer::QueryComposer;
use crate::query::plan::ResultShape;
use crate::schema::SchemaRegistry;

/// The outcome of resolving an association from an instance
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAssociation {
    /// Belongs-to: at most one related instance
    One(Option<EntityInstance>),
    /// Has-many / has-many-through: zero or more related instances in
    /// first-seen order
    Many(Vec<EntityInstance>),
}

impl ResolvedAssociation {
    /// The single related instance, if this is a to-one result
    pub fn as_one(&self) -> Option<&EntityInstance> {
        match self {
            Self::One(instance) => instance.as_ref(),
            Self::Many(_) => None,
        }
    }

    /// The related collection, if this is a to-many result
    pub fn as_many(&self) -> Option<&[EntityInstance]> {
        match self {
            Self::Many(instances) => Some(instances),
            Self::One(_) => None,
        }
    }

    /// Number of related instances
    pub fn len(&self) -> usize {
        match self {
            Self::One(Some(_)) => 1,
            Self::One(None) => 0,
            Self::Many(instances) => instances.len(),
        }
    }

    /// Check whether the result holds no related instances
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves association lookups against an execution adapter, with lazy
/// per-instance caching.
///
/// The schema registry and catalog are read-only during resolution and may
/// be shared read-concurrently. Concurrent resolution of the same
/// (instance, association) pair is not serialized here; racing callers do
/// redundant work and the last write wins in the cache.
pub struct AssociationResolver<A: ExecutionAdapter> {
    schema: Arc<SchemaRegistry>,
    composer: QueryComposer,
    cache: AssociationCache,
    adapter: A,
}

impl<A: ExecutionAdapter> AssociationResolver<A> {
    /// Create a resolver over a frozen schema and catalog
    pub fn new(
        schema: Arc<SchemaRegistry>,
        catalog: Arc<AssociationCatalog>,
        adapter: A,
    ) -> Self {
        Self {
            composer: QueryComposer::new(schema.clone(), catalog),
            schema,
            cache: AssociationCache::new(),
            adapter,
        }
    }

    /// Resolve an association from an instance, returning the memoized
    /// result when present.
    ///
    /// Adapter failures while walking a through chain surface as
    /// `BrokenChain`, so callers can tell "no related rows" from "query
    /// failed". An empty relation is an empty result, never an error.
    pub fn resolve(
        &self,
        instance: &EntityInstance,
        association: &str,
    ) -> AssocResult<ResolvedAssociation> {
        let owner = self.schema.lookup(instance.entity())?;
        let instance_id = instance.identity_key(&owner)?;

        if let Some(cached) = self.cache.get(instance.entity(), &instance_id, association) {
            tracing::debug!(
                "Cache hit for '{}' on {}({})",
                association,
                instance.entity(),
                instance_id
            );
            return Ok(cached);
        }

        let result = self.resolve_uncached(instance, association)?;
        self.cache
            .store(instance.entity(), &instance_id, association, result.clone());
        Ok(result)
    }

    /// Drop cached results for an instance: one association, or all of them.
    ///
    /// Call this after reassigning the instance's own fields.
    pub fn invalidate(&self, instance: &EntityInstance, association: Option<&str>) {
        let Ok(owner) = self.schema.lookup(instance.entity()) else {
            return;
        };
        let Ok(instance_id) = instance.identity_key(&owner) else {
            return;
        };
        match association {
            Some(name) => {
                self.cache.invalidate(instance.entity(), &instance_id, name);
            }
            None => self.cache.invalidate_instance(instance.entity(), &instance_id),
        }
        tracing::debug!(
            "Invalidated cached association(s) for {}({})",
            instance.entity(),
            instance_id
        );
    }

    /// Invalidate one association and resolve it again against current
    /// storage state
    pub fn reload(
        &self,
        instance: &EntityInstance,
        association: &str,
    ) -> AssocResult<ResolvedAssociation> {
        self.invalidate(instance, Some(association));
        self.resolve(instance, association)
    }

    /// Cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The execution adapter behind the resolver
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    fn resolve_uncached(
        &self,
        instance: &EntityInstance,
        association: &str,
    ) -> AssocResult<ResolvedAssociation> {
        let plan = self.composer.build_plan(instance, association)?;
        let through = plan.distinct;

        let rows = self.adapter.execute(&plan).map_err(|err| {
            if through {
                OrmError::BrokenChain {
                    entity: instance.entity().to_string(),
                    association: association.to_string(),
                    source_message: err.to_string(),
                }
            } else {
                err
            }
        })?;

        let target = self.schema.lookup(plan.target_entity())?;
        let mut instances = rows
            .into_iter()
            .map(|row| self.adapter.materialize(&target, row))
            .collect::<AssocResult<Vec<_>>>()?;

        if plan.distinct {
            let mut seen = HashSet::new();
            instances.retain(|candidate| {
                candidate
                    .get(&target.primary_key)
                    .map(|pk| seen.insert(canonical_key(pk)))
                    .unwrap_or(true)
            });
        }

        Ok(match plan.shape {
            ResultShape::One => ResolvedAssociation::One(instances.into_iter().next()),
            ResultShape::Many => ResolvedAssociation::Many(instances),
        })
    }
}
