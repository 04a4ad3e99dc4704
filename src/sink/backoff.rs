//! Reconnect delay schedule used by the connection state machine.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::config::ReconnectPolicy;

/// Produces the sleep between consecutive failed connection attempts.
pub struct ReconnectSchedule {
    policy: ReconnectPolicy,
    current: Duration,
    rng: StdRng,
}

impl ReconnectSchedule {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            current: policy.interval,
            rng: StdRng::from_entropy(),
            policy,
        }
    }

    /// Return to the base interval after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.policy.interval;
    }

    /// Delay to apply after the latest failure.
    pub fn next_delay(&mut self) -> Duration {
        let upper = self.current;
        self.current = self.current.saturating_mul(2).min(self.policy.cap);
        if !self.policy.jitter {
            return upper;
        }
        let max_ms = upper.as_millis().min(u128::from(u64::MAX)) as u64;
        if max_ms < 2 {
            return upper;
        }
        Duration::from_millis(self.rng.gen_range(max_ms / 2..=max_ms))
    }
}
