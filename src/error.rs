//! Error types for model and connection operations.

use thiserror::Error;

/// Result type for all litemodel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by schema derivation, query translation, and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// A persistence operation was attempted on an abstract model.
    #[error("model `{model}` is abstract and cannot be persisted")]
    AbstractModel { model: String },

    /// The database connection has not been opened.
    #[error("database connection is not open")]
    NotConnected,

    /// `delete` was called on a record that has no id.
    #[error("cannot delete a record without an id")]
    MissingId,

    /// A user-supplied validation hook rejected the record state.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A field name does not exist in the target model's metadata.
    #[error("field `{field}` does not exist on model `{model}`")]
    UnknownField { field: String, model: String },

    /// A filter operator outside the supported set.
    #[error("unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    /// Any failure from the underlying storage engine, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
