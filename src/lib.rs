//! # pollvisor
//!
//! **Pollvisor** runs repeating background work ("controllers") and stops it
//! with a deterministic shutdown handshake.
//!
//! A controller calls its work function in a loop: immediately again when the
//! last call did something, after a poll interval when it did not. Stopping a
//! controller (or a whole batch of them) is a two-phase handshake: the caller
//! learns when work is no longer being invoked, may do final bookkeeping, and
//! only then lets the controllers tear down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Work     │   │     Work     │   │     Work     │
//!     │ (user fn #1) │   │ (user fn #2) │   │ (user fn #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Controller  │   │  Controller  │   │  Controller  │ ◄── Runner
//!     │ (work loop)  │   │ (work loop)  │   │ (work loop)  │
//!     └┬─────────▲───┘   └┬─────────▲───┘   └┬─────────▲───┘
//!      │ latches │        │         │        │         │
//!      │         └────────┴─────────┴────────┴─── coordinator
//!      │ Publishes        │ Publishes        │      (quit_and_wait / stop_all)
//!      │ - ControllerStarting                │
//!      │ - WorkFailed     │ - LoopExited     │ - ControllerReleased
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                    (capacity: Config::bus_capacity)               │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                            SubscriberSet
//!                           (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     LogWriter   metrics   custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! run()/start() ─► loop { work ─► Worked: again now │ Idle/Err: wait poll or stop }
//!
//! stop initiator                         work loop
//! ──────────────                         ─────────
//! publish StopRequested, fire stop ───►  leaves loop
//!                                        fire has_stopped ─► LoopExited
//! wait has_stopped ◄─────────────────────┘
//! publish ControllerStopped
//! (Quiesced: final bookkeeping)
//! fire has_completed ─────────────────►  release latches ─► ControllerReleased
//! wait released ◄──────────────────────  fire released, run() returns
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Controllers**   | Repeating work with run/start/stop and a two-phase shutdown.  | [`Controller`], [`ControllerBuilder`]       |
//! | **Batches**       | Stop many controllers in the time of the slowest one.         | [`quit_and_wait`], [`stop_all`], [`Quiesced`] |
//! | **Substitution**  | Consumers depend on a capability, not a concrete type.        | [`Runner`], [`ControllerGroup`]             |
//! | **Work**          | Define work as a closure or a type.                           | [`Work`], [`WorkFn`], [`WorkContext`]       |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics).                | [`Subscribe`], [`SubscriberSet`]            |
//! | **Errors**        | Typed errors for work, lifecycle misuse and grace overruns.   | [`WorkError`], [`ControllerError`]          |
//! | **Configuration** | Centralize defaults.                                          | [`Config`], [`WorkErrorPolicy`]             |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber writing events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use pollvisor::{Bus, Config, Controller, WorkContext, WorkFn, WorkOutcome};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let bus = Bus::new(cfg.bus_capacity_clamped());
//!
//!     let backlog = Arc::new(AtomicU32::new(3));
//!     let work = {
//!         let backlog = Arc::clone(&backlog);
//!         WorkFn::arc(move |_ctx: WorkContext| {
//!             let backlog = Arc::clone(&backlog);
//!             async move {
//!                 let left = backlog.load(Ordering::SeqCst);
//!                 if left == 0 {
//!                     return Ok(WorkOutcome::Idle);
//!                 }
//!                 backlog.store(left - 1, Ordering::SeqCst);
//!                 Ok(WorkOutcome::Worked)
//!             }
//!         })
//!     };
//!
//!     let ctrl = Controller::builder("drain", work)
//!         .config(&cfg)
//!         .poll_interval(Duration::from_millis(50))
//!         .bus(bus)
//!         .build();
//!
//!     ctrl.start()?;
//!     tokio::time::sleep(Duration::from_millis(20)).await;
//!     ctrl.stop().await?;
//!
//!     assert!(ctrl.is_released());
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod runner;
mod subscribers;
mod work;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{
    Controller, ControllerBuilder, ControllerGroup, ControllerState, Latch, LatchView, Quiesced,
    quit_and_wait, stop_all, stop_all_within,
};
pub use error::{ControllerError, LatchError, RuntimeError, WorkError};
pub use events::{Bus, Event, EventKind};
pub use policies::WorkErrorPolicy;
pub use runner::Runner;
pub use subscribers::{Subscribe, SubscriberSet};
pub use work::{BoxWorkFuture, Work, WorkContext, WorkFn, WorkOutcome, WorkRef};

// Built-in `tracing` subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
