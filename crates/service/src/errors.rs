use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid data type: {0}")]
    InvalidType(String),
    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),
    #[error("write failure: {0}")]
    WriteFailure(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn write(context: &str, err: impl std::fmt::Display) -> Self {
        Self::WriteFailure(format!("{context}: {err}"))
    }
}
