//! # Per-invocation context.
//!
//! Every invocation receives a [`WorkContext`] with the controller's identity,
//! read-only views of its `stop` and `has_stopped` latches, the invocation
//! number and the injected [`Bus`].

use std::sync::Arc;

use crate::core::LatchView;
use crate::events::Bus;

/// What a work invocation is handed.
#[derive(Clone, Debug)]
pub struct WorkContext {
    controller: Arc<str>,
    invocation: u64,
    stop: LatchView,
    has_stopped: LatchView,
    bus: Bus,
}

impl WorkContext {
    pub(crate) fn new(
        controller: Arc<str>,
        invocation: u64,
        stop: LatchView,
        has_stopped: LatchView,
        bus: Bus,
    ) -> Self {
        Self {
            controller,
            invocation,
            stop,
            has_stopped,
            bus,
        }
    }

    /// Name of the controller running this invocation.
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// 1-based invocation number.
    pub fn invocation(&self) -> u64 {
        self.invocation
    }

    /// Returns `true` once a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_set()
    }

    /// Completes when a stop is requested.
    ///
    /// Use in `tokio::select!` to abandon long waits promptly.
    pub async fn stopped(&self) {
        self.stop.wait().await;
    }

    /// The controller's `has_stopped` acknowledgment.
    ///
    /// It is only fired after the loop stopped calling work, so an invocation
    /// never observes it set.
    pub fn has_stopped(&self) -> &LatchView {
        &self.has_stopped
    }

    /// The event bus the controller was built with.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}
