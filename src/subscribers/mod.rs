//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling events broadcast through the
//! [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Controller ── publish(Event) ──► Bus ──► SubscriberSet listener
//!                                                 │
//!                                       ┌─────────┼─────────┐
//!                                       ▼         ▼         ▼
//!                                   LogWriter  Metrics   Custom ...
//! ```
//!
//! The logging pipeline of the host application plugs in here: implement
//! [`Subscribe`] (or use [`LogWriter`] with a `tracing` subscriber installed).

mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
