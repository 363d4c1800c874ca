//! Work-loop policies.
//!
//! ## Contents
//! - [`WorkErrorPolicy`] what the work loop does when an invocation returns an error
//!
//! ## Quick wiring
//! ```text
//! Config { on_work_error: WorkErrorPolicy, .. }
//!      └─► ControllerBuilder::config(&cfg) / ControllerBuilder::on_work_error(..)
//!           └─► core::work_loop decides exit/continue after WorkFailed
//! ```
//!
//! ## Defaults
//! - `WorkErrorPolicy::Stop` (an error ends the loop, the handshake still runs).

mod work_error;

pub use work_error::WorkErrorPolicy;
