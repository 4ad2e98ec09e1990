//! Token-bucket limiter for the accrual status lookup
//!
//! One limiter is shared by every caller of the lookup. Over-budget calls are
//! rejected immediately with the delay after which a call would be admitted.

use crate::constants::MIN_RETRY_AFTER_SECS;
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use loyalty_core::{AppError, AppResult};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::warn;

/// Direct (un-keyed) rate limiter for status lookups
pub struct LookupRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl LookupRateLimiter {
    /// `per_second` sustained lookups with bursts of up to `burst`
    ///
    /// Zero values are raised to one.
    pub fn new(per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(burst);

        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Take one token or fail with `RateLimited`
    pub fn check(&self) -> AppResult<()> {
        self.limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after_secs = retry_after_secs(wait);
            warn!(retry_after_secs, "Status lookup rate limit exceeded");
            AppError::RateLimited { retry_after_secs }
        })
    }
}

/// Whole seconds to wait, rounded up, never below the minimum
fn retry_after_secs(wait: Duration) -> u64 {
    let mut secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs += 1;
    }
    secs.max(MIN_RETRY_AFTER_SECS)
}
