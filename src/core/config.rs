//! # Global runtime configuration.
//!
//! Provides [`SupervisorConfig`], centralized settings for the supervisor
//! runtime and its log broadcaster.
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown does not wait; sessions still running are reported stuck

use std::time::Duration;

use crate::events::DEFAULT_BANNER;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `grace`: how long `shutdown()` waits for sessions to report their stop
/// - `banner`: first line of every log tail
///
/// Queue sizes of in-process subscribers are declared by each subscriber
/// through `Subscribe::queue_capacity`; log tails are unbounded.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for sessions to stop during shutdown.
    ///
    /// Sessions that have not reported `stop` by then have their lifecycle
    /// actors cancelled and are listed in `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Synthetic line every log tail starts with.
    pub banner: String,
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `banner = "Listen on logs stream."`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            banner: DEFAULT_BANNER.to_string(),
        }
    }
}
