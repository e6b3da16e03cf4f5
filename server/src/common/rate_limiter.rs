use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Client-side throttle for management requests.
///
/// Resource Manager enforces per-subscription read and write quotas; pacing
/// requests locally keeps long polling loops from tripping them. Clones share
/// one budget.
#[derive(Clone)]
pub struct RateLimiter {
    quota: Arc<DefaultDirectRateLimiter>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// `requests_per_second` of zero is treated as one.
    pub fn new(requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            quota: Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(rate))),
        }
    }

    /// Takes a permit if one is free, otherwise returns how long until the
    /// next one is.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.quota
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Waits for a permit.
    pub async fn acquire(&self) {
        if let Err(wait) = self.try_acquire() {
            log::trace!("Throttling management request for {wait:?}");
            self.quota.until_ready().await;
        }
    }
}
