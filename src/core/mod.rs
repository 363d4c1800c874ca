//! Runtime core: controllers, their work loop and batch shutdown.
//!
//! Internal modules:
//! - [`latch`]: single-use signal replacing the one-slot channels of the handshake;
//! - [`state`]: observable controller lifecycle state;
//! - [`controller`]: the [`Controller`] handle, builder, `run`/`start`/`stop`;
//! - [`work_loop`]: invocation loop and teardown handshake of one controller;
//! - [`coordinator`]: `quit_and_wait`/`stop_all`/`stop_all_within` over many controllers;
//! - [`group`]: [`ControllerGroup`], several controllers behind one [`Runner`](crate::Runner).

mod controller;
mod coordinator;
mod group;
mod latch;
mod state;
mod work_loop;

pub use controller::{Controller, ControllerBuilder};
pub use coordinator::{Quiesced, quit_and_wait, stop_all, stop_all_within};
pub use group::ControllerGroup;
pub use latch::{Latch, LatchView};
pub use state::ControllerState;
