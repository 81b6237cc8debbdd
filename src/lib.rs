//! # Kinship - Association Resolution Engine
//!
//! A small relational mapping core that resolves declared associations
//! between entity types: belongs-to, has-many, and has-many-through.
//! Through chains are flattened into a single joined query plan, results
//! are memoized per instance, and all storage I/O crosses one adapter
//! seam.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use kinship::*;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(SchemaRegistry::new());
//! schema.register(EntityDefinition::new("Game"))?;
//! schema.register(EntityDefinition::new("Review")
//!     .with_fields(vec!["game_id".into(), "user_id".into()]))?;
//! schema.register(EntityDefinition::new("User"))?;
//!
//! let catalog = Arc::new(AssociationCatalog::new(schema.clone()));
//! catalog.declare(AssociationMetadata::has_many("Game", "reviews", "Review"))?;
//! catalog.declare(AssociationMetadata::belongs_to("Review", "user", "User"))?;
//! catalog.declare(AssociationMetadata::has_many_through(
//!     "Game", "users", "User", "reviews",
//! ))?;
//!
//! let resolver = AssociationResolver::new(schema, catalog, MemoryBackend::new());
//! let users = resolver.resolve(&game, "users")?;
//! ```

pub mod associations;
pub mod backends;
pub mod error;
pub mod instance;
pub mod query;
pub mod resolver;
pub mod schema;

pub use associations::*;
pub use backends::{ExecutionAdapter, MemoryBackend, Row};
pub use error::{AssocResult, OrmError};
pub use instance::{canonical_key, EntityInstance};
pub use query::*;
pub use resolver::{AssociationResolver, ResolvedAssociation};
pub use schema::{EntityDefinition, SchemaRegistry};
