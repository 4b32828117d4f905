//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the tree's structural invariants.
/// The pure edit operations never return them; they surface at ingestion and
/// at the caller layer's validation of edit requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("root node must be a condition")]
    RootNotCondition,

    #[error("invalid root id: expected '{expected}', found '{found}'")]
    InvalidRootId { expected: String, found: String },

    #[error("node is not a condition: {0}")]
    NotACondition(String),

    #[error("node is not a requirement: {0}")]
    NotARequirement(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
