//! # Work error policy.
//!
//! [`WorkErrorPolicy`] decides what happens after a work invocation returns `Err`.
//!
//! ```text
//! WorkErrorPolicy::Stop      → publish WorkFailed, exit loop, fire has_stopped
//! WorkErrorPolicy::Continue  → publish WorkFailed, wait poll interval, invoke again
//! ```
//!
//! [`WorkError::Fatal`](crate::WorkError::Fatal) and panics always exit the loop,
//! whatever the policy says.

use crate::error::WorkError;

/// Policy controlling the work loop after a failed invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkErrorPolicy {
    /// Exit the loop on the first error (default).
    #[default]
    Stop,
    /// Treat the error like an idle poll: wait one poll interval and retry.
    Continue,
}

impl WorkErrorPolicy {
    /// Returns `true` when the loop must exit after `err`.
    pub fn exits_on(&self, err: &WorkError) -> bool {
        match self {
            WorkErrorPolicy::Stop => true,
            WorkErrorPolicy::Continue => err.is_fatal(),
        }
    }
}
