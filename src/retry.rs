//! Retry policy for idempotent requests.
//!
//! Delays come from `backoff::ExponentialBackoff`; the number of retries is bounded here
//! rather than by elapsed time.

use std::iter;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;

/// Configuration for automatic retrying of transient failures.
#[derive(Debug, Clone)]
pub struct Retry {
    /// Number of retries (not counting the first try). Zero disables retrying. (default 3)
    pub retries: u32,

    /// Maximum interval between retries. (default 10s)
    pub max_delay: Duration,

    /// Delay before the first retry; doubled on every following one. (default 250ms)
    pub delay_factor: Duration,

    /// delay = delay * random([1 - randomization_factor; 1 + randomization_factor]) (default 0.25)
    pub randomization_factor: f64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            retries: 3,
            max_delay: Duration::from_secs(10),
            delay_factor: Duration::from_millis(250),
            randomization_factor: 0.25,
        }
    }
}

impl Retry {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Default::default()
        }
    }

    /// The waits between attempts of one request, one per allowed retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let mut exponential = ExponentialBackoff {
            initial_interval: self.delay_factor,
            max_interval: self.max_delay,
            randomization_factor: self.randomization_factor,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };
        // picks up initial_interval
        exponential.reset();

        iter::from_fn(move || exponential.next_backoff()).take(self.retries as usize)
    }
}
