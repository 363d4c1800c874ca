//! # Controller lifecycle state.
//!
//! ```text
//! Created ──run/start──► Running ──stop requested──► Stopping
//!    │                      │                           │
//!    │                      └──── loop exited ──────────┤
//!    │                                                  ▼
//!    │                                               Stopped ──has_completed──► Released
//!    └──────────────── stop() before start ────────────────────────────────────────┘
//! ```
//!
//! Transitions only move forward; [`StateCell::advance`] refuses to go back.

use std::sync::atomic::{AtomicU8, Ordering};

/// Observable lifecycle state of a [`Controller`](crate::Controller).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ControllerState {
    /// Built, never started.
    Created = 0,
    /// Work loop running.
    Running = 1,
    /// Stop requested; the loop has not exited yet.
    Stopping = 2,
    /// Loop exited (`has_stopped` fired); waiting for `has_completed`.
    Stopped = 3,
    /// Teardown done; latches released.
    Released = 4,
}

impl ControllerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ControllerState::Created,
            1 => ControllerState::Running,
            2 => ControllerState::Stopping,
            3 => ControllerState::Stopped,
            _ => ControllerState::Released,
        }
    }

    /// Short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerState::Created => "created",
            ControllerState::Running => "running",
            ControllerState::Stopping => "stopping",
            ControllerState::Stopped => "stopped",
            ControllerState::Released => "released",
        }
    }
}

/// Atomic holder for [`ControllerState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ControllerState::Created as u8))
    }

    pub(crate) fn get(&self) -> ControllerState {
        ControllerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from exactly `from` to `to`; returns the observed state on failure.
    pub(crate) fn transition(
        &self,
        from: ControllerState,
        to: ControllerState,
    ) -> Result<(), ControllerState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ControllerState::from_u8)
    }

    /// Moves forward to `to` unless the state is already at or past it.
    ///
    /// Returns `true` when this call changed the state.
    pub(crate) fn advance(&self, to: ControllerState) -> bool {
        let prev = self.0.fetch_max(to as u8, Ordering::AcqRel);
        prev < to as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_never_goes_back() {
        let cell = StateCell::new();
        assert!(cell.advance(ControllerState::Stopped));
        assert!(!cell.advance(ControllerState::Stopping));
        assert_eq!(cell.get(), ControllerState::Stopped);
    }

    #[test]
    fn test_transition_reports_observed_state() {
        let cell = StateCell::new();
        assert_eq!(
            cell.transition(ControllerState::Created, ControllerState::Running),
            Ok(())
        );
        assert_eq!(
            cell.transition(ControllerState::Created, ControllerState::Running),
            Err(ControllerState::Running)
        );
    }
}
