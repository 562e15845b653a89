use thiserror::Error;

/// Errors that can occur in catalog operations.
///
/// A failed lookup during hierarchy resolution is not an error; absence is
/// a valid outcome there. These variants cover malformed input and broken
/// references only.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    #[error("Person not found: {0}")]
    PersonNotFound(String),
}
