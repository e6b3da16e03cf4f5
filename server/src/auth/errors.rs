use std::path::PathBuf;
use thiserror::Error;

/// Failures while resolving credentials or acquiring a management token.
///
/// Every variant is fatal for a run: nothing has been created yet, so no
/// rollback is attempted.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Missing credential setting '{setting}'. Set it in config.toml or via {env_hint}")]
    MissingSetting {
        setting: &'static str,
        env_hint: &'static str,
    },

    #[error("Failed to read credential file {}: {reason}", path.display())]
    CredentialFile { path: PathBuf, reason: String },

    #[error("Token request failed: {0}")]
    TokenRequest(String),

    #[error("Authentication failed: {0}")]
    Rejected(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}
