//! Request pacing for external services.
//!
//! One limiter exists per upstream API key and is shared by every pipeline
//! run, so concurrent requests draw from the same budget.

use std::fmt;
use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct RateLimiter {
    name: &'static str,
    /// `None` when limiting is disabled.
    limiter: Option<DirectLimiter>,
}

impl RateLimiter {
    /// `requests_per_minute == 0` disables limiting. Up to `burst` requests
    /// go out back to back before pacing starts.
    pub fn new(name: &'static str, requests_per_minute: u32, burst: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_minute).map(|per_minute| {
            let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
            governor::RateLimiter::direct(Quota::per_minute(per_minute).allow_burst(burst))
        });

        Self { name, limiter }
    }

    pub fn unlimited(name: &'static str) -> Self {
        Self::new(name, 0, 1)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };

        if limiter.check().is_ok() {
            return;
        }

        tracing::debug!(limiter = self.name, "Rate limit reached, pacing request");
        limiter.until_ready().await;
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("limited", &self.is_limited())
            .finish()
    }
}
