//! # Process-wide controller defaults.
//!
//! Provides [`Config`] centralized settings, created once at startup and passed
//! down explicitly:
//! 1. **Bus creation**: `Bus::new(cfg.bus_capacity_clamped())`
//! 2. **Controller defaults**: `Controller::builder(name, work).config(&cfg)`
//! 3. **Groups**: `ControllerGroup::new(cfg, bus)`
//!
//! ## Sentinel values
//! - `grace = 0s` → no limit (`ControllerGroup::stop_within` waits like `stop`)
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::WorkErrorPolicy;

/// Default controller settings.
///
/// ## Field semantics
/// - `poll_interval`: delay after an idle invocation before the next one
/// - `on_work_error`: what the loop does after a failed invocation
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: bound for [`ControllerGroup::stop_within`](crate::ControllerGroup::stop_within) (`0s` = unlimited)
#[derive(Clone, Debug)]
pub struct Config {
    /// Delay between idle invocations.
    ///
    /// The wait is interrupted immediately by a stop request.
    pub poll_interval: Duration,

    /// Policy applied when an invocation returns an error.
    pub on_work_error: WorkErrorPolicy,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Slow receivers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// Maximum wait for a group shutdown before reporting stuck controllers.
    pub grace: Duration,
}

impl Config {
    /// Returns the grace period as an `Option`.
    ///
    /// - `None` → wait without limit
    /// - `Some(d)` → bounded wait
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval = 1s`
    /// - `on_work_error = WorkErrorPolicy::Stop`
    /// - `bus_capacity = 1024`
    /// - `grace = 0s` (unlimited)
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            on_work_error: WorkErrorPolicy::default(),
            bus_capacity: 1024,
            grace: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_grace_means_unlimited() {
        let cfg = Config::default();
        assert_eq!(cfg.grace_limit(), None);

        let cfg = Config {
            grace: Duration::from_secs(3),
            ..Config::default()
        };
        assert_eq!(cfg.grace_limit(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
