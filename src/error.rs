use thiserror::Error;

/// Crate-wide error taxonomy. Every variant maps to a user-visible,
/// retry-able condition; nothing here is fatal to the process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("AI service rate limit reached, please try again shortly")]
    RateLimited,

    #[error("AI service quota exhausted for this account")]
    QuotaExhausted,

    #[error("AI service error: {0}")]
    Oracle(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("camera access denied: {0}")]
    CameraAccessDenied(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<crate::storage::DatabaseError> for AppError {
    fn from(e: crate::storage::DatabaseError) -> Self {
        AppError::Persistence(e.to_string())
    }
}
