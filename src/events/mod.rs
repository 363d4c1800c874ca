//! Controller events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by controllers, their work
//! loops and the coordinator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Controller` (start/stop/teardown), `core::work_loop`
//!   (work failures, loop exit), `core::coordinator` (stopping/stopped, grace),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `SubscriberSet` listeners (e.g. `LogWriter`), or any
//!   receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
