//! Error types for the cm-app service layer.

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("System not found: {0}")]
    SystemNotFound(String),

    #[error("Chemistry error: {0}")]
    Chemistry(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cm-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cm_project::ProjectError> for AppError {
    fn from(err: cm_project::ProjectError) -> Self {
        match err {
            cm_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<cm_system::ChemmisolError> for AppError {
    fn from(err: cm_system::ChemmisolError) -> Self {
        AppError::Chemistry(err.to_string())
    }
}

impl From<cm_results::ResultsError> for AppError {
    fn from(err: cm_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
