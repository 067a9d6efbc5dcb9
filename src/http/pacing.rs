//! Request pacing
//!
//! Parallel page fetches all hit the same host. A pacer shared by every
//! attempt of one client keeps the combined request rate under a quota.
//! Uses the governor crate's token bucket.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Quota for a [`RequestPacer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before pacing starts
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_burst() -> u32 {
    1
}

impl PacingConfig {
    /// Create a quota
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        Self {
            requests_per_second,
            burst,
        }
    }
}

type Bucket = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Token bucket shared by all clones
#[derive(Clone)]
pub struct RequestPacer {
    bucket: Arc<Bucket>,
    config: PacingConfig,
}

impl RequestPacer {
    /// Create a pacer; zero values are raised to one
    pub fn new(config: PacingConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
        Self {
            bucket: Arc::new(RateLimiter::direct(
                Quota::per_second(rate).allow_burst(burst),
            )),
            config,
        }
    }

    /// The quota this pacer enforces
    pub fn config(&self) -> PacingConfig {
        self.config
    }

    /// Wait for the next token
    pub async fn until_ready(&self) {
        self.bucket.until_ready().await;
    }

    /// Take a token if one is available now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
