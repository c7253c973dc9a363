//! Constants for the fetch module (timeouts, politeness).

use std::time::Duration;

/// Timeout for a whole request, connect included (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pause between two requests when robots.txt says nothing.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_millis(500);

/// Maximum number of redirects followed for one request.
pub const MAX_REDIRECTS: usize = 10;
