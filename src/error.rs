use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// A required configuration value is absent or blank.
    #[error("No {0} found")]
    MissingConfig(&'static str),

    #[error("Invalid {0}")]
    InvalidConfig(String),

    /// The AWS service rejected or failed the call.
    #[error("Upstream error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::MissingConfig(_) | AppError::InvalidConfig(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
