//! # Function-backed work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn(WorkContext) -> Fut`, producing a fresh
//! future per invocation. State shared between invocations lives in an
//! `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use pollvisor::{WorkContext, WorkFn, WorkOutcome, WorkRef};
//!
//! let w: WorkRef = WorkFn::arc(|ctx: WorkContext| async move {
//!     if ctx.is_stop_requested() {
//!         return Ok(WorkOutcome::Idle);
//!     }
//!     Ok(WorkOutcome::Worked)
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::WorkError;
use crate::work::work::{BoxWorkFuture, Work, WorkOutcome};
use crate::work::WorkContext;

/// Function-backed work implementation.
#[derive(Debug)]
pub struct WorkFn<F> {
    f: F,
}

impl<F, Fut> WorkFn<F>
where
    F: Fn(WorkContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<WorkOutcome, WorkError>> + Send + 'static,
{
    /// Wraps `f`.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`](crate::WorkRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(WorkContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<WorkOutcome, WorkError>> + Send + 'static,
{
    fn call(&self, ctx: WorkContext) -> BoxWorkFuture {
        Box::pin((self.f)(ctx))
    }
}
