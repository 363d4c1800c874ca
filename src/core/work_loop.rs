//! # Work loop: drives one controller from start to release.
//!
//! ```text
//! publish ControllerStarting
//! loop {
//!   ├─► stop set? ──────────────────────────────► exit
//!   ├─► invoke work (panics caught)
//!   │     ├─► Ok(Worked) ─► stop set? exit : yield, next call now
//!   │     ├─► Ok(Idle)   ─┐
//!   │     └─► Err(e)     ─┴─► publish WorkFailed; policy says exit? exit
//!   └─► select { biased; stop ─► exit, sleep(poll) ─► next call }
//! }
//! fire has_stopped ─► Stopped ─► publish LoopExited
//! wait has_completed ─► release latches ─► Released ─► publish ControllerReleased ─► fire released
//! ```
//!
//! ## Rules
//! - Work is never invoked concurrently with itself and never after `has_stopped`.
//! - `has_stopped` is fired by this loop only, exactly once.
//! - The busy path yields to the scheduler between invocations.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use tokio::time;

use crate::core::controller::Shared;
use crate::core::state::ControllerState;
use crate::error::{WorkError, panic_message};
use crate::events::{Event, EventKind};
use crate::work::WorkOutcome;

/// Why the loop stopped calling work.
enum Exit {
    StopRequested,
    Failed(&'static str),
}

impl Exit {
    fn as_label(&self) -> &'static str {
        match self {
            Exit::StopRequested => "stop_requested",
            Exit::Failed(label) => *label,
        }
    }
}

/// Runs the work loop, then the teardown handshake.
pub(crate) async fn drive(shared: Arc<Shared>) {
    shared.publish(EventKind::ControllerStarting);

    let exit = poll(&shared).await;
    acknowledge(&shared, &exit);

    shared.has_completed.wait().await;
    shared.release_latches();
    shared.state.advance(ControllerState::Released);
    shared.publish(EventKind::ControllerReleased);
    if let Err(e) = shared.released.fire() {
        shared.report_violation("released", e);
    }
}

async fn poll(shared: &Shared) -> Exit {
    loop {
        if shared.stop.is_set() {
            return Exit::StopRequested;
        }

        let invocation = shared.invocations.fetch_add(1, Ordering::AcqRel) + 1;
        match invoke(shared, invocation).await {
            Ok(WorkOutcome::Worked) => {
                if shared.stop.is_set() {
                    return Exit::StopRequested;
                }
                tokio::task::yield_now().await;
                continue;
            }
            Ok(WorkOutcome::Idle) => {}
            Err(err) => {
                shared.bus.publish(
                    Event::new(EventKind::WorkFailed)
                        .with_controller(Arc::clone(&shared.name))
                        .with_invocation(invocation)
                        .with_reason(err.to_string()),
                );
                if shared.on_work_error.exits_on(&err) {
                    return Exit::Failed(err.as_label());
                }
            }
        }

        tokio::select! {
            biased;
            _ = shared.stop.wait() => return Exit::StopRequested,
            _ = time::sleep(shared.poll_interval) => {}
        }
    }
}

async fn invoke(shared: &Shared, invocation: u64) -> Result<WorkOutcome, WorkError> {
    let fut = shared.work.call(shared.context(invocation));
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(WorkError::Panicked {
            info: panic_message(&*panic),
        }),
    }
}

/// Fires `has_stopped` and announces the exit.
fn acknowledge(shared: &Shared, exit: &Exit) {
    if let Err(e) = shared.has_stopped.fire() {
        shared.report_violation("has_stopped", e);
    }
    shared.state.advance(ControllerState::Stopped);
    shared.bus.publish(
        Event::new(EventKind::LoopExited)
            .with_controller(Arc::clone(&shared.name))
            .with_invocation(shared.invocations.load(Ordering::Acquire))
            .with_reason(exit.as_label()),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64};
    use std::time::Duration;

    use tokio::time::Instant;

    use crate::core::Controller;
    use crate::events::Bus;
    use crate::policies::WorkErrorPolicy;
    use crate::work::{WorkContext, WorkFn, WorkRef};

    use super::*;

    fn counting<F>(f: F) -> (WorkRef, Arc<AtomicU64>)
    where
        F: Fn(u64) -> Result<WorkOutcome, WorkError> + Send + Sync + 'static,
    {
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);
        let f = Arc::new(f);
        let work: WorkRef = WorkFn::arc(move |_ctx: WorkContext| {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            let f = Arc::clone(&f);
            async move { f(n) }
        });
        (work, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_work_is_called_again_without_waiting() {
        let (work, calls) = counting(|n| Ok((n <= 5).into()));
        let ctrl = Controller::new("busy", work, Duration::from_secs(3600), Bus::new(64));
        let started = Instant::now();
        ctrl.start().unwrap();

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert!(started.elapsed() < Duration::from_secs(1));

        ctrl.stop().await.unwrap();
        assert_eq!(ctrl.invocations(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_work_waits_poll_interval_and_stop_interrupts() {
        let (work, calls) = counting(|_| Ok(WorkOutcome::Idle));
        let ctrl = Controller::new("idle", work, Duration::from_millis(100), Bus::new(64));
        ctrl.start().unwrap();

        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let stopping = Instant::now();
        ctrl.stop().await.unwrap();
        assert!(stopping.elapsed() < Duration::from_millis(100));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_ends_loop_without_stop() {
        let (work, calls) = counting(|n| {
            if n == 3 {
                Err(WorkError::fail("third call"))
            } else {
                Ok(WorkOutcome::Worked)
            }
        });
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let ctrl = Controller::new("flaky", work, Duration::from_millis(10), bus);
        ctrl.start().unwrap();

        ctrl.stopped().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(ctrl.state(), ControllerState::Stopped);
        assert!(!ctrl.is_stop_requested());
        assert!(!ctrl.is_released());

        let failed = loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::WorkFailed {
                break ev;
            }
        };
        assert_eq!(failed.invocation, Some(3));
        assert_eq!(failed.reason.as_deref(), Some("work failed: third call"));

        ctrl.stop().await.unwrap();
        assert_eq!(ctrl.state(), ControllerState::Released);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_policy_keeps_polling_until_fatal() {
        let (work, calls) = counting(|n| {
            if n == 4 {
                Err(WorkError::fatal("gone"))
            } else {
                Err(WorkError::fail("retry"))
            }
        });
        let ctrl = Controller::builder("stubborn", work)
            .poll_interval(Duration::from_millis(10))
            .on_work_error(WorkErrorPolicy::Continue)
            .build();
        ctrl.start().unwrap();

        ctrl.stopped().await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        ctrl.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_is_reported_and_handshake_completes() {
        let work = WorkFn::arc(|_ctx: WorkContext| async {
            if true {
                panic!("work exploded");
            }
            Ok(WorkOutcome::Idle)
        });
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let ctrl = Controller::new("panicky", work, Duration::from_millis(10), bus);
        ctrl.start().unwrap();
        ctrl.stopped().await;

        let failed = loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::WorkFailed {
                break ev;
            }
        };
        assert_eq!(failed.reason.as_deref(), Some("work panicked: work exploded"));

        ctrl.stop().await.unwrap();
        assert!(ctrl.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_shortly_after_start_beats_poll_interval() {
        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let ctrl = Controller::new("quick", work, Duration::from_secs(1), Bus::new(64));
        let started = Instant::now();
        ctrl.start().unwrap();

        time::sleep(Duration::from_millis(50)).await;
        ctrl.stop().await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(ctrl.has_stopped());
        assert!(ctrl.has_completed());
        assert_eq!(ctrl.state(), ControllerState::Released);
    }

    #[tokio::test(start_paused = true)]
    async fn test_work_never_sees_has_stopped() {
        let violated = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&violated);
        let work = WorkFn::arc(move |ctx: WorkContext| {
            if ctx.has_stopped().is_set() {
                flag.store(true, Ordering::SeqCst);
            }
            async { Ok(WorkOutcome::Idle) }
        });
        let ctrl = Controller::new("watch", work, Duration::from_millis(1), Bus::new(64));
        ctrl.start().unwrap();
        time::sleep(Duration::from_millis(5)).await;
        ctrl.stop().await.unwrap();

        assert!(!violated.load(Ordering::SeqCst));
        assert!(ctrl.invocations() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_stop_is_idempotent() {
        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let ctrl = Controller::new("twice", work, Duration::from_millis(100), Bus::new(64));
        ctrl.start().unwrap();
        time::sleep(Duration::from_millis(10)).await;

        let (a, b) = tokio::join!(ctrl.stop(), ctrl.stop());
        assert_eq!(a, Ok(()));
        assert_eq!(b, Ok(()));
        assert_eq!(ctrl.stop().await, Ok(()));
        assert_eq!(ctrl.state(), ControllerState::Released);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_in_place_returns_after_stop() {
        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let ctrl = Controller::new("inline", work, Duration::from_millis(100), Bus::new(64));

        let runner = ctrl.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(ctrl.state(), ControllerState::Running);

        ctrl.stop().await.unwrap();
        assert_eq!(handle.await.unwrap(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_publishes_handshake_in_order() {
        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let ctrl = Controller::new("ordered", work, Duration::from_millis(100), bus);
        ctrl.start().unwrap();
        time::sleep(Duration::from_millis(10)).await;
        ctrl.stop().await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::ControllerStarting,
                EventKind::StopRequested,
                EventKind::LoopExited,
                EventKind::ControllerStopped,
                EventKind::ControllerReleased,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_run_future_still_stops() {
        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let ctrl = Controller::new("detached", work, Duration::from_millis(100), Bus::new(64));

        tokio::select! {
            _ = ctrl.run() => panic!("run returned without a stop"),
            _ = time::sleep(Duration::from_millis(150)) => {}
        }
        assert_eq!(ctrl.state(), ControllerState::Running);

        let stopped = time::timeout(Duration::from_secs(60), ctrl.stop()).await;
        assert_eq!(stopped, Ok(Ok(())));
        assert!(ctrl.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_protocol_violation_on_either_stop_path() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let unstarted = Controller::new("unstarted", work, Duration::from_millis(100), bus.clone());
        unstarted.stop().await.unwrap();

        let (work, _calls) = counting(|_| Ok(WorkOutcome::Idle));
        let started = Controller::new("started", work, Duration::from_millis(100), bus);
        started.start().unwrap();
        time::sleep(Duration::from_millis(10)).await;
        started.stop().await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::ControllerReleased));
        assert!(!kinds.contains(&EventKind::ProtocolViolation));
    }
}
