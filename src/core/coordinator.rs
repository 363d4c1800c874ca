//! # Batch shutdown of many controllers.
//!
//! ```text
//! quit_and_wait(ctrls)
//!   ├─► for each: publish StopRequested ─► fire stop
//!   ├─► JoinSet: one waiter per controller ─► wait has_stopped ─► publish ControllerStopped
//!   └─► join all (barrier) ─► Quiesced
//!
//! Quiesced::complete()
//!   └─► for each: fire has_completed ─► wait released
//! ```
//!
//! Shutdown latency of a batch is the slowest controller, not the sum: every
//! stop is signalled before any acknowledgment is awaited.
//!
//! ## Rules
//! - `quit_and_wait` has no timeout and no error return.
//! - A dropped [`Quiesced`] still fires `has_completed`, so no `run` stays parked.
//! - [`stop_all_within`] bounds the wait; stuck controllers keep their stop
//!   requested and are completed in the background whenever they exit.

use std::time::Duration;

use tokio::task::JoinSet;

use crate::core::controller::Controller;
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};

/// Guard marking that every controller of a batch has exited its work loop.
///
/// Work is no longer being invoked, but no `run` has returned yet. Use this
/// window for final bookkeeping, then call [`Quiesced::complete`].
#[must_use = "dropping Quiesced completes the batch without waiting for teardown"]
#[derive(Debug)]
pub struct Quiesced {
    controllers: Vec<Controller>,
}

impl Quiesced {
    /// Controllers in this batch.
    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    /// Fires `has_completed` for each controller and waits for their teardown.
    pub async fn complete(mut self) {
        let controllers = std::mem::take(&mut self.controllers);
        for ctrl in &controllers {
            ctrl.complete();
        }
        for ctrl in &controllers {
            ctrl.released().await;
        }
    }
}

impl Drop for Quiesced {
    fn drop(&mut self) {
        for ctrl in &self.controllers {
            ctrl.complete();
        }
    }
}

/// Requests a stop on every controller and waits until all loops exited.
///
/// Returns once every controller fired `has_stopped`. Controllers that were
/// never started are released on the spot.
pub async fn quit_and_wait(controllers: &[Controller]) -> Quiesced {
    signal(controllers);
    await_stopped(controllers).await;
    Quiesced {
        controllers: controllers.to_vec(),
    }
}

/// Stops every controller and waits for full teardown.
pub async fn stop_all(controllers: &[Controller]) {
    quit_and_wait(controllers).await.complete().await;
}

/// Like [`stop_all`], but gives up waiting for loop exits after `grace`.
///
/// A zero `grace` waits without limit. On timeout the stuck controllers are
/// reported by name (sorted); the ones that did stop are torn down normally.
/// Outcome events go to the first controller's bus.
pub async fn stop_all_within(
    controllers: &[Controller],
    grace: Duration,
) -> Result<(), RuntimeError> {
    if grace.is_zero() {
        stop_all(controllers).await;
        return Ok(());
    }
    let Some(bus) = controllers.first().map(|c| c.bus().clone()) else {
        return Ok(());
    };

    signal(controllers);
    if tokio::time::timeout(grace, await_stopped(controllers))
        .await
        .is_ok()
    {
        Quiesced {
            controllers: controllers.to_vec(),
        }
        .complete()
        .await;
        bus.publish(Event::new(EventKind::AllStoppedWithin).with_grace(grace));
        return Ok(());
    }

    let (stopped, stuck): (Vec<Controller>, Vec<Controller>) =
        controllers.iter().cloned().partition(|c| c.has_stopped());

    let mut names: Vec<String> = stuck.iter().map(|c| c.name().to_string()).collect();
    names.sort();
    bus.publish(
        Event::new(EventKind::GraceExceeded)
            .with_grace(grace)
            .with_reason(names.join(",")),
    );

    for ctrl in stuck {
        tokio::spawn(async move {
            ctrl.stopped().await;
            ctrl.complete();
        });
    }
    Quiesced {
        controllers: stopped,
    }
    .complete()
    .await;

    Err(RuntimeError::GraceExceeded {
        grace,
        stuck: names,
    })
}

fn signal(controllers: &[Controller]) {
    for ctrl in controllers {
        ctrl.request_stop();
    }
}

/// Counting barrier over `has_stopped`.
async fn await_stopped(controllers: &[Controller]) {
    let mut set = JoinSet::new();
    for ctrl in controllers {
        let ctrl = ctrl.clone();
        set.spawn(async move {
            ctrl.stopped().await;
            ctrl.bus()
                .publish(Event::new(EventKind::ControllerStopped).with_controller(ctrl.name()));
        });
    }
    while set.join_next().await.is_some() {}
}
