//! # Lifecycle events emitted by controllers and the coordinator.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: controller start, loop exit, release
//! - **Work events**: failed invocations
//! - **Shutdown events**: stop requests, acknowledgments, grace outcome
//! - **Internal events**: subscriber overflow/panic, protocol violations
//!
//! The [`Event`] struct carries metadata such as timestamps, the controller
//! name, reasons and invocation counts.
//!
//! ## Ordering
//! `seq` comes from one process-wide counter. Subscribers run on separate
//! queues, so sort by `seq` when merging what several of them recorded.
//!
//! ## Example
//! ```rust
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkFailed)
//!     .with_controller("ingest")
//!     .with_reason("connection refused")
//!     .with_invocation(3);
//!
//! assert_eq!(ev.kind, EventKind::WorkFailed);
//! assert_eq!(ev.controller.as_deref(), Some("ingest"));
//! assert_eq!(ev.invocation, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Source of `Event::seq`.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// A subscriber's `on_event` panicked.
    ///
    /// Sets:
    /// - `controller`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// An event was dropped for one subscriber.
    ///
    /// Sets:
    /// - `controller`: subscriber name
    /// - `reason`: `subscriber=<name> reason=full|closed`
    SubscriberOverflow,

    // === Controller lifecycle ===
    /// The work loop is starting.
    ///
    /// Sets:
    /// - `controller`: controller name
    ControllerStarting,

    /// A work invocation returned an error.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `invocation`: 1-based invocation number
    /// - `reason`: error message
    WorkFailed,

    /// The work loop exited and `has_stopped` was fired.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `invocation`: total invocations performed
    /// - `reason`: `"stop_requested"` or the error label that ended the loop
    LoopExited,

    /// The run observed `has_completed` and released its latches.
    ///
    /// Sets:
    /// - `controller`: controller name
    ControllerReleased,

    // === Shutdown ===
    /// A stop was requested ("stopping"), published before the stop latch fires.
    ///
    /// Sets:
    /// - `controller`: controller name
    StopRequested,

    /// The stop initiator observed `has_stopped` ("stopped").
    ///
    /// Sets:
    /// - `controller`: controller name
    ControllerStopped,

    /// Every controller of a bounded batch stopped within the grace window.
    ///
    /// Sets:
    /// - `grace_ms`: configured grace (ms)
    AllStoppedWithin,

    /// A bounded batch shutdown ran out of grace.
    ///
    /// Sets:
    /// - `grace_ms`: configured grace (ms)
    /// - `reason`: comma separated names of stuck controllers
    GraceExceeded,

    // === Protocol ===
    /// A latch write was refused (double write or write after release).
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `reason`: latch name and error label
    ProtocolViolation,
}

/// Controller event with optional metadata.
///
/// Which optional fields are filled depends on `kind`; see the `Sets:` list
/// on each [`EventKind`] variant.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide publish order.
    pub seq: u64,
    /// When the event was created.
    pub at: SystemTime,
    /// What happened.
    pub kind: EventKind,
    /// Name of the controller (or subscriber), if applicable.
    pub controller: Option<Arc<str>>,
    /// Error text, exit reason or stuck controller names.
    pub reason: Option<Arc<str>>,
    /// Invocation number or count.
    pub invocation: Option<u64>,
    /// Grace window in milliseconds (compact).
    pub grace_ms: Option<u32>,
}

impl Event {
    /// Stamps a new event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            controller: None,
            reason: None,
            invocation: None,
            grace_ms: None,
        }
    }

    /// Attaches a controller name.
    #[inline]
    pub fn with_controller(mut self, name: impl Into<Arc<str>>) -> Self {
        self.controller = Some(name.into());
        self
    }

    /// Attaches a reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an invocation number.
    #[inline]
    pub fn with_invocation(mut self, n: u64) -> Self {
        self.invocation = Some(n);
        self
    }

    /// Attaches a grace window (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// `SubscriberOverflow` for `subscriber`.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_controller(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// `SubscriberPanicked` for `subscriber`.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_controller(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::StopRequested);
        let b = Event::new(EventKind::ControllerStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_grace_saturates_to_u32() {
        let ev = Event::new(EventKind::GraceExceeded).with_grace(Duration::from_secs(u64::MAX));
        assert_eq!(ev.grace_ms, Some(u32::MAX));
    }
}
