//! # Work abstractions.
//!
//! This module provides the work-related types a controller drives:
//! - [`Work`] - trait for one cancelable increment of work
//! - [`WorkFn`] - closure-backed implementation
//! - [`WorkRef`] - shared reference to work (`Arc<dyn Work>`)
//! - [`WorkContext`] - what each invocation is handed
//! - [`WorkOutcome`] - whether the invocation found something to do

mod context;
#[allow(clippy::module_inception)]
mod work;
mod work_fn;

pub use context::WorkContext;
pub use work::{BoxWorkFuture, Work, WorkOutcome, WorkRef};
pub use work_fn::WorkFn;
