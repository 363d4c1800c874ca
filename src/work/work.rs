//! # Work abstraction.
//!
//! A [`Work`] performs **one increment** of work per call and reports whether it
//! did anything. It does not schedule itself: the controller decides when the
//! next call happens.
//!
//! ```text
//! Ok(WorkOutcome::Worked) → called again right away (unless a stop is pending)
//! Ok(WorkOutcome::Idle)   → next call after the poll interval (or never, on stop)
//! Err(WorkError)          → reported, then WorkErrorPolicy decides
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::WorkError;
use crate::work::WorkContext;

/// Result of one successful invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkOutcome {
    /// Something was done; there may be more right now.
    Worked,
    /// Nothing to do; wait one poll interval.
    Idle,
}

impl From<bool> for WorkOutcome {
    /// `true` maps to [`WorkOutcome::Worked`].
    fn from(did_work: bool) -> Self {
        if did_work {
            WorkOutcome::Worked
        } else {
            WorkOutcome::Idle
        }
    }
}

/// Boxed future returned by [`Work::call`].
pub type BoxWorkFuture =
    Pin<Box<dyn Future<Output = Result<WorkOutcome, WorkError>> + Send + 'static>>;

/// Shared handle to a work implementation.
pub type WorkRef = Arc<dyn Work>;

/// # Repeatable, cancelable unit of work.
///
/// Long invocations should watch [`WorkContext::stopped`] and return early.
///
/// # Example
/// ```
/// use pollvisor::{BoxWorkFuture, Work, WorkContext, WorkOutcome};
///
/// struct Drain;
///
/// impl Work for Drain {
///     fn call(&self, ctx: WorkContext) -> BoxWorkFuture {
///         Box::pin(async move {
///             if ctx.is_stop_requested() {
///                 return Ok(WorkOutcome::Idle);
///             }
///             // pop one item...
///             Ok(WorkOutcome::Worked)
///         })
///     }
/// }
/// ```
pub trait Work: Send + Sync + 'static {
    /// Starts one invocation.
    fn call(&self, ctx: WorkContext) -> BoxWorkFuture;
}
