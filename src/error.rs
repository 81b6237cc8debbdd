//! Error types for the association engine
//!
//! Declaration-time errors (duplicate entities, unknown entities, ordering
//! and cycle violations in association declarations) indicate a programming
//! error in the association graph and should abort the registration phase.
//! `BrokenChain` is the only runtime fault surfaced by the core; retry
//! policy, if any, belongs to the execution adapter.

use thiserror::Error;

/// Result type alias for association engine operations
pub type AssocResult<T> = Result<T, OrmError>;

/// Error types for schema registration, association declaration, and
/// association resolution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrmError {
    /// An entity with this name is already registered
    #[error("entity '{0}' is already registered")]
    DuplicateEntity(String),

    /// An association with this name is already declared on the entity
    #[error("association '{association}' is already declared on entity '{entity}'")]
    DuplicateAssociation { entity: String, association: String },

    /// The named entity is not present in the schema registry
    #[error("entity '{0}' is not registered")]
    UnknownEntity(String),

    /// The named association is not declared on the entity
    #[error("association '{association}' is not declared on entity '{entity}'")]
    UnknownAssociation { entity: String, association: String },

    /// A through declaration references an association that has not been
    /// declared on the owner yet (declaration order violation)
    #[error(
        "association '{association}' on '{entity}' goes through '{through}', \
         which is not declared on '{entity}' yet"
    )]
    UndeclaredThroughAssociation {
        entity: String,
        association: String,
        through: String,
    },

    /// The through chain cannot be walked down to the declared target
    #[error(
        "through chain for '{association}' on '{entity}' cannot reach target \
         '{target}': {reason}"
    )]
    UnresolvableThroughChain {
        entity: String,
        association: String,
        target: String,
        reason: String,
    },

    /// The through chain revisits the owning entity type
    #[error("through chain for '{association}' on '{entity}' revisits '{entity}'")]
    CyclicAssociation { entity: String, association: String },

    /// The execution adapter failed while resolving an intermediate step of
    /// a through chain
    #[error(
        "execution failed while resolving through chain '{association}' on \
         '{entity}': {source_message}"
    )]
    BrokenChain {
        entity: String,
        association: String,
        source_message: String,
    },

    /// Execution adapter failure outside a through chain
    #[error("execution error: {0}")]
    Execution(String),

    /// An instance is missing the primary key field its entity declares
    #[error("instance of '{entity}' is missing primary key field '{field}'")]
    MissingPrimaryKey { entity: String, field: String },
}

impl OrmError {
    /// Returns true for errors that indicate a broken association graph.
    ///
    /// These are fatal to configuration: callers should halt the
    /// registration phase rather than retry.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            OrmError::DuplicateEntity(_)
                | OrmError::DuplicateAssociation { .. }
                | OrmError::UnknownEntity(_)
                | OrmError::UnknownAssociation { .. }
                | OrmError::UndeclaredThroughAssociation { .. }
                | OrmError::UnresolvableThroughChain { .. }
                | OrmError::CyclicAssociation { .. }
        )
    }

    /// Returns true for faults raised at resolution time
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            OrmError::BrokenChain { .. }
                | OrmError::Execution(_)
                | OrmError::MissingPrimaryKey { .. }
        )
    }
}
