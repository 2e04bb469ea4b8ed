//! Storage error taxonomy.

use helpdesk_core::error::CoreError;

/// Errors surfaced by [`HelpdeskStore`](crate::HelpdeskStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<sqlx::Error> for StoreError {
    /// Classify a sqlx error.
    ///
    /// - `RowNotFound` maps to `NotFound`.
    /// - PostgreSQL unique violations (`23505`) map to `DuplicateKey`.
    /// - Decode and encode failures map to `InvalidArgument`.
    /// - Everything else (I/O, TLS, pool exhaustion, ...) is `StorageUnavailable`.
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "Row",
                id: 0,
            },
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some("23505") {
                    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                    StoreError::DuplicateKey(constraint)
                } else {
                    tracing::error!(error = %db_err, "Database error");
                    StoreError::StorageUnavailable(db_err.to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::Encode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::InvalidArgument(err.to_string()),
            other => {
                tracing::error!(error = %other, "Storage error");
                StoreError::StorageUnavailable(other.to_string())
            }
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            CoreError::InvalidArgument(msg) => StoreError::InvalidArgument(msg),
            CoreError::Forbidden(msg) => {
                StoreError::StorageUnavailable(msg)
            }
        }
    }
}
