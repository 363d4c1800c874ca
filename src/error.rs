//! Error types used by controllers, work functions and the coordinator.
//!
//! This module defines four enums:
//!
//! - [`WorkError`]: errors raised by a single work invocation.
//! - [`ControllerError`]: lifecycle misuse of a [`Controller`](crate::Controller).
//! - [`LatchError`]: protocol violations on a single-use [`Latch`](crate::Latch).
//! - [`RuntimeError`]: failures of a bounded batch shutdown.
//!
//! All of them provide `as_label` (a stable snake_case label for logs/metrics).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a work invocation.
///
/// A work error never aborts the caller of [`Controller::run`](crate::Controller::run):
/// it is published as [`EventKind::WorkFailed`](crate::EventKind::WorkFailed) and the
/// controller applies its [`WorkErrorPolicy`](crate::WorkErrorPolicy).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The invocation failed; the policy decides whether polling continues.
    #[error("work failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error: the work loop always exits.
    #[error("fatal work error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The work function panicked; treated like [`WorkError::Fatal`].
    #[error("work panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl WorkError {
    /// Shorthand for [`WorkError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`WorkError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        WorkError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::WorkError;
    ///
    /// assert_eq!(WorkError::fail("boom").as_label(), "work_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Fatal { .. } => "work_fatal",
            WorkError::Panicked { .. } => "work_panicked",
        }
    }

    /// Returns `true` when the loop must exit regardless of policy.
    ///
    /// # Example
    /// ```
    /// use pollvisor::WorkError;
    ///
    /// assert!(WorkError::fatal("disk gone").is_fatal());
    /// assert!(!WorkError::fail("try later").is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkError::Fatal { .. } | WorkError::Panicked { .. })
    }
}

/// # Lifecycle misuse of a controller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// `run`/`start` was called on a controller that already started.
    #[error("controller {name:?} already started")]
    AlreadyStarted {
        /// Controller name.
        name: String,
    },

    /// The controller finished its teardown and cannot be used again.
    #[error("controller {name:?} already released")]
    Released {
        /// Controller name.
        name: String,
    },
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::AlreadyStarted { .. } => "controller_already_started",
            ControllerError::Released { .. } => "controller_released",
        }
    }
}

/// # Protocol violation on a single-use latch.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchError {
    /// The latch was already fired once.
    #[error("latch already set")]
    AlreadySet,

    /// The latch was released and accepts no more writes.
    #[error("latch released")]
    Released,
}

impl LatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LatchError::AlreadySet => "latch_already_set",
            LatchError::Released => "latch_released",
        }
    }
}

/// # Errors produced by a bounded batch shutdown.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Some controllers did not acknowledge the stop within the grace window.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of controllers whose work loop had not exited (sorted).
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panicked_counts_as_fatal() {
        let err = WorkError::Panicked {
            info: "index out of bounds".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.as_label(), "work_panicked");
    }

    #[test]
    fn test_controller_error_message_names_controller() {
        let err = ControllerError::AlreadyStarted {
            name: "ingest".into(),
        };
        assert_eq!(err.to_string(), "controller \"ingest\" already started");
        assert_eq!(err.as_label(), "controller_already_started");
    }

    #[test]
    fn test_grace_exceeded_lists_stuck() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_millis(250),
            stuck: vec!["a".into(), "b".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("250ms"));
        assert!(msg.contains("\"a\""));
    }
}
