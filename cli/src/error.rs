use crate::config::ConfigLoadError;
use server::auth::AuthError;
use thiserror::Error;

/// Errors that stop the CLI before or around a run. Failures inside the
/// walkthrough itself are reported through its outcome instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error("Authentication setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to initialize logging: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type AppResult<T> = Result<T, AppError>;
