use super::errors::AuthError;
use async_trait::async_trait;
use zeroize::Zeroizing;

/// Bearer token for the Resource Manager endpoint.
#[derive(Clone)]
pub struct AuthToken {
    pub token: Zeroizing<String>,
    /// Scheme for the `Authorization` header, always `Bearer` for ARM
    pub token_type: String,
    /// Lifetime in seconds from issue, when the issuer reported one
    pub expires_in_secs: Option<u64>,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

/// Source of management-plane access tokens. Wrapped in a
/// [`TokenCache`](super::TokenCache) by the ARM client, so implementations
/// may hit the network on every call.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Acquires a token, hitting the identity endpoint if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the credentials are rejected or the token
    /// endpoint cannot be reached.
    async fn authenticate(&self) -> Result<AuthToken, AuthError>;

    /// `false` for tokens that are handed over once and never renewed.
    fn renewable(&self) -> bool {
        true
    }
}

/// Provider for a token acquired out of band, e.g. with `az account
/// get-access-token`.
pub struct StaticTokenProvider {
    token: Zeroizing<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn authenticate(&self) -> Result<AuthToken, AuthError> {
        if self.token.trim().is_empty() {
            return Err(AuthError::MissingSetting {
                setting: "access_token",
                env_hint: "AZURE_ACCESS_TOKEN",
            });
        }
        Ok(AuthToken {
            token: self.token.clone(),
            token_type: "Bearer".to_string(),
            expires_in_secs: None,
        })
    }

    fn renewable(&self) -> bool {
        false
    }
}
