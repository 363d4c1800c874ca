//! # Single-use signal.
//!
//! A [`Latch`] replaces a one-slot channel used as "written once, read once":
//! it can be fired at most once, awaited by any number of waiters, and released
//! once. After release it still reports whether it was set, but refuses writes.
//!
//! ```text
//!   pending ──fire()──► set ──release()──► set + released
//!      │                                        ▲
//!      └──────────────release()─────────────────┘ (pending + released)
//!
//! fire() on set        → Err(AlreadySet)
//! fire() on released   → Err(Released)
//! wait() on set        → returns immediately
//! ```
//!
//! Built on [`CancellationToken`] for the wait side and atomics for the
//! single-writer guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::error::LatchError;

#[derive(Debug, Default)]
struct LatchInner {
    written: AtomicBool,
    released: AtomicBool,
    token: CancellationToken,
}

/// Settable-once completion signal.
///
/// Cloning yields another handle to the same latch.
#[derive(Clone, Debug, Default)]
pub struct Latch {
    inner: Arc<LatchInner>,
}

impl Latch {
    /// Creates a pending latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch and wakes every waiter.
    ///
    /// Exactly one call can succeed over the latch lifetime.
    pub fn fire(&self) -> Result<(), LatchError> {
        if self.inner.released.load(Ordering::Acquire) {
            return Err(LatchError::Released);
        }
        if self.inner.written.swap(true, Ordering::AcqRel) {
            return Err(LatchError::AlreadySet);
        }
        self.inner.token.cancel();
        Ok(())
    }

    /// Returns `true` once the latch was fired.
    pub fn is_set(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when the latch is fired (immediately if it already is).
    pub async fn wait(&self) {
        self.inner.token.cancelled().await;
    }

    /// Marks the latch unusable for writes. Idempotent.
    pub fn release(&self) {
        self.inner.released.store(true, Ordering::Release);
    }

    /// Returns `true` once the latch was released.
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Read-only handle suitable for handing to work functions.
    pub fn view(&self) -> LatchView {
        LatchView {
            latch: self.clone(),
        }
    }
}

/// Read-only side of a [`Latch`]: can observe and await, never fire or release.
#[derive(Clone, Debug)]
pub struct LatchView {
    latch: Latch,
}

impl LatchView {
    /// Returns `true` once the underlying latch was fired.
    pub fn is_set(&self) -> bool {
        self.latch.is_set()
    }

    /// Completes when the underlying latch is fired.
    pub async fn wait(&self) {
        self.latch.wait().await;
    }
}
