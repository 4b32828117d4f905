//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("transaction already exists: {0}")]
    TransactionExists(String),

    #[error("invalid transaction key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("malformed document for transaction {key}")]
    Document {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("selector failed: {0}")]
    Selector(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
