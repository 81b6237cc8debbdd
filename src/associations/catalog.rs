//! Association Catalog - declaration storage, ordering, and cycle checks
//!
//! The catalog owns every declared association, keyed by owner entity type.
//! Declaration order matters for through associations: the association a
//! through reference names must already be in the catalog, which turns the
//! source lesson's reliance on statement ordering into an explicit, checked
//! rule. Cycles fail at declaration time, never at resolution.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::associations::metadata::AssociationMetadata;
use crate::error::{AssocResult, OrmError};
use crate::schema::SchemaRegistry;

/// Thread-safe catalog of association declarations
#[derive(Debug)]
pub struct AssociationCatalog {
    schema: Arc<SchemaRegistry>,

    /// Map of owner entity name -> association name -> metadata
    associations: DashMap<String, HashMap<String, AssociationMetadata>>,
}

impl AssociationCatalog {
    /// Create an empty catalog validating against the given schema registry
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self {
            schema,
            associations: DashMap::new(),
        }
    }

    /// Declare an association.
    ///
    /// Both the owner and the target must be registered entities. Through
    /// declarations additionally require their through reference to be
    /// declared already, a walkable chain down to the target, and no revisit
    /// of the owner type anywhere along the chain. A second declaration
    /// under an existing name is rejected with `DuplicateAssociation`:
    /// through chains are validated against the declarations present when
    /// they are declared, and replacing one of those later could invalidate
    /// an already-accepted chain.
    ///
    /// Declarations belong to a single-threaded build phase; the catalog is
    /// read-only afterwards. Concurrent declares are not serialized against
    /// chain expansion.
    pub fn declare(&self, metadata: AssociationMetadata) -> AssocResult<()> {
        metadata.validate()?;
        self.schema.lookup(&metadata.owner)?;
        self.schema.lookup(&metadata.target)?;

        if self.has_association(&metadata.owner, &metadata.name) {
            return Err(OrmError::DuplicateAssociation {
                entity: metadata.owner.clone(),
                association: metadata.name.clone(),
            });
        }

        if metadata.kind.is_through() {
            let hops = self.expand(&metadata, &mut Vec::new())?;
            if hops.iter().any(|hop| hop.target == metadata.owner) {
                return Err(OrmError::CyclicAssociation {
                    entity: metadata.owner.clone(),
                    association: metadata.name.clone(),
                });
            }
        }

        tracing::debug!(
            "Declared association '{}' on '{}' targeting '{}'",
            metadata.name,
            metadata.owner,
            metadata.target
        );

        self.associations
            .entry(metadata.owner.clone())
            .or_default()
            .insert(metadata.name.clone(), metadata);

        Ok(())
    }

    /// Resolve a declared association by owner and name
    pub fn resolve(&self, owner: &str, name: &str) -> AssocResult<AssociationMetadata> {
        self.get(owner, name)
            .ok_or_else(|| OrmError::UnknownAssociation {
                entity: owner.to_string(),
                association: name.to_string(),
            })
    }

    /// Expand an association into its ordered sequence of direct hops.
    ///
    /// Direct associations expand to themselves. Through associations are
    /// walked down the full chain, so a through referencing another through
    /// still flattens into one hop sequence that composes into a single
    /// joined query plan.
    pub fn expand_chain(&self, owner: &str, name: &str) -> AssocResult<Vec<AssociationMetadata>> {
        let metadata = self.resolve(owner, name)?;
        self.expand(&metadata, &mut Vec::new())
    }

    /// Check whether an association is declared
    pub fn has_association(&self, owner: &str, name: &str) -> bool {
        self.get(owner, name).is_some()
    }

    /// Names of all associations declared on an owner
    pub fn association_names(&self, owner: &str) -> Vec<String> {
        self.associations
            .get(owner)
            .map(|entry| entry.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Catalog statistics
    pub fn stats(&self) -> CatalogStats {
        let total_owners = self.associations.len();
        let mut total_associations = 0;
        let mut through_associations = 0;
        for entry in self.associations.iter() {
            for metadata in entry.value().values() {
                total_associations += 1;
                if metadata.kind.is_through() {
                    through_associations += 1;
                }
            }
        }
        CatalogStats {
            total_owners,
            total_associations,
            through_associations,
        }
    }

    fn get(&self, owner: &str, name: &str) -> Option<AssociationMetadata> {
        self.associations.get(owner)?.get(name).cloned()
    }

    /// Recursive chain expansion. `visited` holds (owner, name) pairs to
    /// guard against self-referential loops while walking.
    fn expand(
        &self,
        metadata: &AssociationMetadata,
        visited: &mut Vec<(String, String)>,
    ) -> AssocResult<Vec<AssociationMetadata>> {
        if !metadata.kind.is_through() {
            return Ok(vec![metadata.clone()]);
        }

        let key = (metadata.owner.clone(), metadata.name.clone());
        if visited.contains(&key) {
            return Err(OrmError::CyclicAssociation {
                entity: metadata.owner.clone(),
                association: metadata.name.clone(),
            });
        }
        visited.push(key);

        let Some(through_name) = metadata.through.as_deref() else {
            return Err(OrmError::UnresolvableThroughChain {
                entity: metadata.owner.clone(),
                association: metadata.name.clone(),
                target: metadata.target.clone(),
                reason: "declaration is missing a through reference".to_string(),
            });
        };
        let through = self.get(&metadata.owner, through_name).ok_or_else(|| {
            OrmError::UndeclaredThroughAssociation {
                entity: metadata.owner.clone(),
                association: metadata.name.clone(),
                through: through_name.to_string(),
            }
        })?;

        let mut hops = self.expand(&through, visited)?;
        let terminal = hops
            .last()
            .map(|hop| hop.target.clone())
            .unwrap_or_else(|| through.target.clone());

        let source = self.find_source(&terminal, metadata)?;
        let tail = self.expand(&source, visited)?;
        let reached = tail
            .last()
            .map(|hop| hop.target.clone())
            .unwrap_or_else(|| source.target.clone());

        if reached != metadata.target {
            return Err(OrmError::UnresolvableThroughChain {
                entity: metadata.owner.clone(),
                association: metadata.name.clone(),
                target: metadata.target.clone(),
                reason: format!(
                    "source association '{}' on '{}' targets '{}'",
                    source.name, terminal, reached
                ),
            });
        }

        hops.extend(tail);
        Ok(hops)
    }

    /// Find the source association on the through chain's terminal entity
    fn find_source(
        &self,
        terminal: &str,
        metadata: &AssociationMetadata,
    ) -> AssocResult<AssociationMetadata> {
        let candidates = metadata.source_candidates();
        for candidate in &candidates {
            if let Some(source) = self.get(terminal, candidate) {
                return Ok(source);
            }
        }
        Err(OrmError::UnresolvableThroughChain {
            entity: metadata.owner.clone(),
            association: metadata.name.clone(),
            target: metadata.target.clone(),
            reason: format!(
                "no association named {} is declared on '{}'",
                candidates
                    .iter()
                    .map(|c| format!("'{c}'"))
                    .collect::<Vec<_>>()
                    .join(" or "),
                terminal
            ),
        })
    }
}

/// Statistics about the association catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_owners: usize,
    pub total_associations: usize,
    pub through_associations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::associations::metadata::AssociationKind;
    use crate::schema::EntityDefinition;

    fn registry_with(entities: &[&str]) -> Arc<SchemaRegistry> {
        let registry = SchemaRegistry::new();
        for entity in entities {
            registry.register(EntityDefinition::new(*entity)).unwrap();
        }
        Arc::new(registry)
    }

    fn lesson_catalog() -> AssociationCatalog {
        let schema = registry_with(&["Game", "Review", "User"]);
        let catalog = AssociationCatalog::new(schema);
        catalog
            .declare(AssociationMetadata::has_many("Game", "reviews", "Review"))
            .unwrap();
        catalog
            .declare(AssociationMetadata::has_many("User", "reviews", "Review"))
            .unwrap();
        catalog
            .declare(AssociationMetadata::belongs_to("Review", "game", "Game"))
            .unwrap();
        catalog
            .declare(AssociationMetadata::belongs_to("Review", "user", "User"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_declare_and_resolve() {
        let catalog = lesson_catalog();
        let reviews = catalog.resolve("Game", "reviews").unwrap();
        assert_eq!(reviews.kind, AssociationKind::HasMany);
        assert_eq!(reviews.target, "Review");
        assert!(catalog.has_association("Review", "game"));
    }

    #[test]
    fn test_unknown_association_fails() {
        let catalog = lesson_catalog();
        let err = catalog.resolve("Game", "players").unwrap_err();
        assert_eq!(
            err,
            OrmError::UnknownAssociation {
                entity: "Game".to_string(),
                association: "players".to_string(),
            }
        );
    }

    #[test]
    fn test_declare_with_unregistered_target_fails() {
        let schema = registry_with(&["Game"]);
        let catalog = AssociationCatalog::new(schema);
        let err = catalog
            .declare(AssociationMetadata::has_many("Game", "reviews", "Review"))
            .unwrap_err();
        assert_eq!(err, OrmError::UnknownEntity("Review".to_string()));
    }

    #[test]
    fn test_through_before_base_declaration_fails() {
        let schema = registry_with(&["Game", "Review", "User"]);
        let catalog = AssociationCatalog::new(schema);

        // has_many :users, through: :reviews before has_many :reviews
        let err = catalog
            .declare(AssociationMetadata::has_many_through(
                "Game", "users", "User", "reviews",
            ))
            .unwrap_err();
        assert_eq!(
            err,
            OrmError::UndeclaredThroughAssociation {
                entity: "Game".to_string(),
                association: "users".to_string(),
                through: "reviews".to_string(),
            }
        );
    }

    #[test]
    fn test_through_declaration_expands_to_direct_hops() {
        let catalog = lesson_catalog();
        catalog
            .declare(AssociationMetadata::has_many_through(
                "Game", "users", "User", "reviews",
            ))
            .unwrap();

        let hops = catalog.expand_chain("Game", "users").unwrap();
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0].name, "reviews");
        assert_eq!(hops[0].kind, AssociationKind::HasMany);
        assert_eq!(hops[1].name, "user");
        assert_eq!(hops[1].kind, AssociationKind::BelongsTo);
    }

    #[test]
    fn test_through_without_source_on_intermediate_fails() {
        let schema = registry_with(&["Game", "Review", "User"]);
        let catalog = AssociationCatalog::new(schema);
        catalog
            .declare(AssociationMetadata::has_many("Game", "reviews", "Review"))
            .unwrap();

        // Review declares nothing pointing at User
        let err = catalog
            .declare(AssociationMetadata::has_many_through(
                "Game", "users", "User", "reviews",
            ))
            .unwrap_err();
        assert!(matches!(err, OrmError::UnresolvableThroughChain { .. }));
    }

    #[test]
    fn test_through_source_target_mismatch_fails() {
        let catalog = lesson_catalog();
        // Explicit source 'game' on Review targets Game, not User
        let err = catalog
            .declare(
                AssociationMetadata::has_many_through("Game", "users", "User", "reviews")
                    .with_source("game"),
            )
            .unwrap_err();
        assert!(matches!(err, OrmError::UnresolvableThroughChain { .. }));
    }

    #[test]
    fn test_duplicate_association_name_fails() {
        let catalog = lesson_catalog();
        let err = catalog
            .declare(AssociationMetadata::has_many("Game", "reviews", "Review"))
            .unwrap_err();
        assert_eq!(
            err,
            OrmError::DuplicateAssociation {
                entity: "Game".to_string(),
                association: "reviews".to_string(),
            }
        );
        assert!(err.is_declaration_error());
    }

    #[test]
    fn test_redeclaration_cannot_break_a_validated_chain() {
        let catalog = lesson_catalog();
        catalog
            .declare(AssociationMetadata::has_many_through(
                "Game", "users", "User", "reviews",
            ))
            .unwrap();

        // Retargeting the source association the chain was validated
        // against is rejected, so the accepted chain stays walkable
        let err = catalog
            .declare(AssociationMetadata::belongs_to("Review", "user", "Game"))
            .unwrap_err();
        assert!(matches!(err, OrmError::DuplicateAssociation { .. }));

        let hops = catalog.expand_chain("Game", "users").unwrap();
        assert_eq!(hops.last().unwrap().target, "User");
    }

    #[test]
    fn test_chain_revisiting_owner_fails() {
        let catalog = lesson_catalog();
        // Game -> reviews -> game lands back on the owner type
        let err = catalog
            .declare(
                AssociationMetadata::has_many_through("Game", "sibling_games", "Game", "reviews")
                    .with_source("game"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            OrmError::CyclicAssociation {
                entity: "Game".to_string(),
                association: "sibling_games".to_string(),
            }
        );
    }

    #[test]
    fn test_multi_level_through_chain() {
        let schema = registry_with(&["Publisher", "Game", "Review", "User"]);
        let catalog = AssociationCatalog::new(schema);
        catalog
            .declare(AssociationMetadata::has_many("Publisher", "games", "Game"))
            .unwrap();
        catalog
            .declare(AssociationMetadata::has_many("Game", "reviews", "Review"))
            .unwrap();
        catalog
            .declare(AssociationMetadata::belongs_to("Review", "user", "User"))
            .unwrap();
        catalog
            .declare(AssociationMetadata::has_many_through(
                "Publisher",
                "reviews",
                "Review",
                "games",
            ))
            .unwrap();
        catalog
            .declare(
                AssociationMetadata::has_many_through("Publisher", "reviewers", "User", "reviews")
                    .with_source("user"),
            )
            .unwrap();

        let hops = catalog.expand_chain("Publisher", "reviewers").unwrap();
        let path: Vec<&str> = hops.iter().map(|hop| hop.target.as_str()).collect();
        assert_eq!(path, vec!["Game", "Review", "User"]);
    }

    #[test]
    fn test_catalog_stats() {
        let catalog = lesson_catalog();
        catalog
            .declare(AssociationMetadata::has_many_through(
                "Game", "users", "User", "reviews",
            ))
            .unwrap();

        let stats = catalog.stats();
        assert_eq!(stats.total_owners, 3);
        assert_eq!(stats.total_associations, 5);
        assert_eq!(stats.through_associations, 1);

        let mut names = catalog.association_names("Game");
        names.sort();
        assert_eq!(names, vec!["reviews", "users"]);
    }
}
