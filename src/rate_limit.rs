//! Client-side throttling of color changes.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// A shared gate that drops calls arriving too close together.
///
/// The bridge firmware falls over when a drag-based color picker streams
/// updates at input speed, so color changes pass through one of these:
/// a call landing inside the minimum interval after the last *accepted*
/// call is dropped outright. Nothing is queued and nothing is retried;
/// the next picker update will get through once the window has passed.
///
/// Construct one at application start and hand it to
/// [`BridgeClient`](crate::BridgeClient) so the gate is explicit rather
/// than hidden module state.
///
/// ```
/// use hue_lights_rs::RateLimiter;
///
/// let limiter = RateLimiter::default();
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

    /// Create a gate with a custom minimum interval between accepted calls.
    pub fn new(min_interval: Duration) -> Self {
        RateLimiter {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Try to pass the gate.
    ///
    /// Returns `true` and records the call as the most recent one if enough
    /// time has passed since the last accepted call, `false` otherwise.
    pub fn try_acquire(&self) -> bool {
        let mut last_call = self
            .last_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match *last_call {
            Some(last) if last.elapsed() < self.min_interval => false,
            _ => {
                *last_call = Some(Instant::now());
                true
            }
        }
    }
}

impl Default for RateLimiter {
    /// The 200 ms interval the bridge comfortably keeps up with.
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
