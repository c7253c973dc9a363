//! Politeness delay between consecutive requests of one run.
//!
//! A run talks to one source at a time and never has two requests in
//! flight, so a single "last request" timestamp is all the state needed.
//! [`wait_if_needed`] is the primitive; [`RateLimiter`] wraps it and stamps
//! each request.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use harvester_core::fetch::RateLimiter;
//!
//! # async fn example() {
//! let mut limiter = RateLimiter::new(Duration::from_millis(500));
//!
//! // First request proceeds immediately
//! limiter.acquire().await;
//!
//! // Second request waits until 500ms after the first
//! limiter.acquire().await;
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Cumulative waiting after which a warning is logged once.
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Sleeps until `last_request + delay` if that lies in the future.
///
/// Returns the time slept. A missing `last_request` never sleeps.
pub async fn wait_if_needed(last_request: Option<Instant>, delay: Duration) -> Duration {
    let Some(last_request) = last_request else {
        return Duration::ZERO;
    };
    let elapsed = last_request.elapsed();
    if elapsed >= delay {
        return Duration::ZERO;
    }
    let remaining = delay.saturating_sub(elapsed);
    tokio::time::sleep(remaining).await;
    remaining
}

/// Enforces the politeness delay of one run.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Option<Instant>,
    cumulative: Duration,
    warned: bool,
}

impl RateLimiter {
    /// Creates a limiter with the given delay between requests.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = delay.as_millis()))]
    pub fn new(delay: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            delay,
            last_request: None,
            cumulative: Duration::ZERO,
            warned: false,
        }
    }

    /// Total time spent waiting so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        self.cumulative
    }

    /// Waits for the politeness delay, then records a request as starting now.
    pub async fn acquire(&mut self) {
        let slept = wait_if_needed(self.last_request, self.delay).await;
        if !slept.is_zero() {
            self.cumulative += slept;
            debug!(
                delay_ms = slept.as_millis(),
                cumulative_ms = self.cumulative.as_millis(),
                "applied politeness delay"
            );
            if !self.warned && self.cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                self.warned = true;
                warn!(
                    cumulative_delay_secs = self.cumulative.as_secs(),
                    "politeness delay dominates this run"
                );
            }
        }
        self.last_request = Some(Instant::now());
    }
}
