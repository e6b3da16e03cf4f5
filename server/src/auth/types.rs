use std::time::{Duration, Instant};
use zeroize::Zeroizing;

/// Tokens are re-acquired this long before they actually expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// A cached authentication token with expiration tracking.
#[derive(Clone)]
pub struct CachedToken {
    pub token: Zeroizing<String>,
    /// `None` for tokens that never expire from our point of view
    pub expires_at: Option<Instant>,
}

impl CachedToken {
    pub fn new(token: Zeroizing<String>, expires_in: Option<Duration>) -> Self {
        Self {
            token,
            expires_at: expires_in.map(|lifetime| Instant::now() + lifetime),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    /// True once the token is inside the five minute refresh margin.
    pub fn needs_refresh(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() + REFRESH_MARGIN >= expires_at)
    }
}
