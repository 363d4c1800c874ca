//! # LogWriter: `tracing` bridge
//!
//! A subscriber that turns incoming [`Event`]s into `tracing` records under the
//! `pollvisor` target. Where the records go (console, files, OS log) is decided by
//! the `tracing` subscriber the host application installs.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO pollvisor: controller starting controller="ingest"
//! ERROR pollvisor: work invocation failed controller="ingest" invocation=3 error="simulated"
//! INFO pollvisor: controller is stopping controller="ingest"
//! INFO pollvisor: work loop exited controller="ingest" invocations=3 reason="work_failed"
//! INFO pollvisor: controller has stopped controller="ingest"
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let controller = e.controller.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ControllerStarting => {
                info!(target: "pollvisor", controller, "controller starting");
            }
            EventKind::WorkFailed => {
                error!(
                    target: "pollvisor",
                    controller,
                    invocation = e.invocation,
                    error = reason,
                    "work invocation failed"
                );
            }
            EventKind::LoopExited => {
                info!(
                    target: "pollvisor",
                    controller,
                    invocations = e.invocation,
                    reason,
                    "work loop exited"
                );
            }
            EventKind::ControllerReleased => {
                debug!(target: "pollvisor", controller, "controller released");
            }
            EventKind::StopRequested => {
                info!(target: "pollvisor", controller, "controller is stopping");
            }
            EventKind::ControllerStopped => {
                info!(target: "pollvisor", controller, "controller has stopped");
            }
            EventKind::AllStoppedWithin => {
                info!(target: "pollvisor", grace_ms = e.grace_ms, "all controllers stopped within grace");
            }
            EventKind::GraceExceeded => {
                warn!(target: "pollvisor", grace_ms = e.grace_ms, stuck = reason, "shutdown grace exceeded");
            }
            EventKind::ProtocolViolation => {
                error!(target: "pollvisor", controller, violation = reason, "controller protocol violation");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "pollvisor", subscriber = controller, reason, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "pollvisor", subscriber = controller, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
