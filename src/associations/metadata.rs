//! Association Metadata - declarative relationship descriptions
//!
//! Metadata is plain data: it names the owner, the target, and how the two
//! are keyed together. The catalog validates it against the schema registry
//! at declaration time; the query composer turns it into join steps at
//! resolution time.

use serde::{Deserialize, Serialize};

use crate::error::{AssocResult, OrmError};

/// The kind of association between two entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    /// The owner holds a foreign key referencing exactly one target instance
    BelongsTo,
    /// The target holds a foreign key referencing the owner; yields zero or
    /// more rows
    HasMany,
    /// A collection association whose join path traverses an intermediate
    /// association instead of a direct foreign key
    HasManyThrough,
}

impl AssociationKind {
    /// Returns true if this kind yields a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::HasManyThrough)
    }

    /// Returns true if this kind resolves through an intermediate association
    pub fn is_through(self) -> bool {
        matches!(self, Self::HasManyThrough)
    }
}

/// A declared association on an owning entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationMetadata {
    /// Owning entity type name
    pub owner: String,

    /// Association name, unique per owner
    pub name: String,

    /// The kind of association
    pub kind: AssociationKind,

    /// Target entity type name
    pub target: String,

    /// Foreign key field override; when absent the conventional
    /// `<entity>_id` name is derived
    pub foreign_key: Option<String>,

    /// For through associations: the already-declared association on the
    /// owner that the join path traverses
    pub through: Option<String>,

    /// For through associations: the association name on the through
    /// entity's type that leads to the target. Defaults to this
    /// association's name, then to the lowercased target name.
    pub source: Option<String>,
}

impl AssociationMetadata {
    /// Declare a belongs-to association: `owner.<fk>` references the target
    /// primary key
    pub fn belongs_to(
        owner: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            kind: AssociationKind::BelongsTo,
            target: target.into(),
            foreign_key: None,
            through: None,
            source: None,
        }
    }

    /// Declare a has-many association: `target.<fk>` references the owner
    /// primary key
    pub fn has_many(
        owner: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            kind: AssociationKind::HasMany,
            target: target.into(),
            foreign_key: None,
            through: None,
            source: None,
        }
    }

    /// Declare a has-many-through association traversing `through`
    pub fn has_many_through(
        owner: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            kind: AssociationKind::HasManyThrough,
            target: target.into(),
            foreign_key: None,
            through: Some(through.into()),
            source: None,
        }
    }

    /// Override the derived foreign key field name
    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }

    /// Set the source association name on the through entity's type
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The foreign key field this association joins on.
    ///
    /// BelongsTo stores `<target>_id` on the owner; HasMany stores
    /// `<owner>_id` on the target. Through associations have no foreign key
    /// of their own.
    pub fn effective_foreign_key(&self) -> String {
        if let Some(ref fk) = self.foreign_key {
            return fk.clone();
        }
        match self.kind {
            AssociationKind::BelongsTo => format!("{}_id", self.target.to_lowercase()),
            AssociationKind::HasMany | AssociationKind::HasManyThrough => {
                format!("{}_id", self.owner.to_lowercase())
            }
        }
    }

    /// Candidate source association names on the through entity's terminal
    /// type, in lookup order
    pub fn source_candidates(&self) -> Vec<String> {
        match self.source {
            Some(ref source) => vec![source.clone()],
            None => vec![self.name.clone(), self.target.to_lowercase()],
        }
    }

    /// Validate internal consistency of the declaration
    pub fn validate(&self) -> AssocResult<()> {
        if self.kind.is_through() && self.through.is_none() {
            return Err(OrmError::UnresolvableThroughChain {
                entity: self.owner.clone(),
                association: self.name.clone(),
                target: self.target.clone(),
                reason: "declaration is missing a through reference".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_properties() {
        assert!(AssociationKind::HasMany.is_collection());
        assert!(AssociationKind::HasManyThrough.is_collection());
        assert!(!AssociationKind::BelongsTo.is_collection());

        assert!(AssociationKind::HasManyThrough.is_through());
        assert!(!AssociationKind::HasMany.is_through());
    }

    #[test]
    fn test_belongs_to_foreign_key_default() {
        let metadata = AssociationMetadata::belongs_to("Review", "game", "Game");
        assert_eq!(metadata.effective_foreign_key(), "game_id");
    }

    #[test]
    fn test_has_many_foreign_key_default() {
        let metadata = AssociationMetadata::has_many("Game", "reviews", "Review");
        assert_eq!(metadata.effective_foreign_key(), "game_id");
    }

    #[test]
    fn test_foreign_key_override() {
        let metadata = AssociationMetadata::belongs_to("Review", "author", "User")
            .with_foreign_key("author_id");
        assert_eq!(metadata.effective_foreign_key(), "author_id");
    }

    #[test]
    fn test_source_candidates() {
        let metadata = AssociationMetadata::has_many_through("Game", "users", "User", "reviews");
        assert_eq!(metadata.source_candidates(), vec!["users", "user"]);

        let explicit = metadata.with_source("reviewer");
        assert_eq!(explicit.source_candidates(), vec!["reviewer"]);
    }

    #[test]
    fn test_validate_rejects_through_without_reference() {
        let mut metadata =
            AssociationMetadata::has_many_through("Game", "users", "User", "reviews");
        metadata.through = None;
        assert!(metadata.validate().is_err());
    }
}
