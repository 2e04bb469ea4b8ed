#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}
