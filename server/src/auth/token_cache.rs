use super::errors::AuthError;
use super::provider::AuthProvider;
use super::types::CachedToken;
use std::sync::Arc;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

/// Caches the token of one [`AuthProvider`] and re-acquires it when it gets
/// close to expiry.
#[derive(Clone)]
pub struct TokenCache {
    provider: Arc<dyn AuthProvider>,
    cached: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns a valid bearer token, authenticating again when needed.
    pub async fn token(&self) -> Result<Zeroizing<String>, AuthError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref().filter(|token| !token.needs_refresh()) {
                return Ok(token.token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref().filter(|token| !token.needs_refresh()) {
            return Ok(token.token.clone());
        }

        log::debug!("Acquiring management access token");
        let fresh = self.provider.authenticate().await?;
        let lifetime = if self.provider.renewable() {
            fresh.expires_in_secs.map(std::time::Duration::from_secs)
        } else {
            None
        };
        let token = fresh.token.clone();
        *cached = Some(CachedToken::new(fresh.token, lifetime));
        Ok(token)
    }

    /// Drops the cached token, e.g. after the service rejected it.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthToken;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        expires_in_secs: Option<u64>,
    }

    #[async_trait]
    impl AuthProvider for CountingProvider {
        async fn authenticate(&self) -> Result<AuthToken, AuthError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthToken {
                token: Zeroizing::new(format!("token-{call}")),
                token_type: "Bearer".to_string(),
                expires_in_secs: self.expires_in_secs,
            })
        }
    }

    #[tokio::test]
    async fn long_lived_token_is_reused() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expires_in_secs: Some(3600),
        });
        let cache = TokenCache::new(provider.clone());

        assert_eq!(cache.token().await.unwrap().as_str(), "token-0");
        assert_eq!(cache.token().await.unwrap().as_str(), "token-0");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_inside_refresh_margin_is_replaced() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expires_in_secs: Some(60),
        });
        let cache = TokenCache::new(provider.clone());

        cache.token().await.unwrap();
        assert_eq!(cache.token().await.unwrap().as_str(), "token-1");
    }

    #[tokio::test]
    async fn invalidate_forces_new_token() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            expires_in_secs: None,
        });
        let cache = TokenCache::new(provider.clone());

        cache.token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.token().await.unwrap().as_str(), "token-1");
    }
}
