//! # Subscriber extension point.
//!
//! [`Subscribe`] is how a host application observes controllers: loggers,
//! metrics exporters, shutdown auditors. Attach implementations to a bus with
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Bus ──► SubscriberSet ──► queue (queue_capacity) ──► worker ──► on_event(&Event)
//! ```
//!
//! A subscriber only ever slows down its own queue. When that queue is full
//! the event is dropped for it alone and `EventKind::SubscriberOverflow` is
//! published; a panic in `on_event` becomes `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use pollvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::WorkFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "failure_counter"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives controller events on a dedicated worker task.
///
/// Keep `on_event` non-blocking; it runs on the tokio runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publish order for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue size for this subscriber (at least 1). Defaults to 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
