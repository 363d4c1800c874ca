//! # Controller: one repeating unit of work with a deterministic shutdown.
//!
//! A [`Controller`] owns one [`Work`](crate::Work), its poll interval, its
//! error policy, an injected [`Bus`] and four latches:
//!
//! | latch           | written by                   | meaning                                 |
//! |-----------------|------------------------------|-----------------------------------------|
//! | `stop`          | stop initiator               | stop requested                          |
//! | `has_stopped`   | work loop only               | loop exited, work no longer invoked     |
//! | `has_completed` | stop initiator only          | run may tear down and return            |
//! | `released`      | work loop after teardown     | latches released, `stop()` may return   |
//!
//! ## Lifecycle
//! ```text
//! start()/run() ──► work loop ──► has_stopped ──► wait has_completed ──► release ──► released
//!                      ▲                               ▲
//! stop() ── fire stop ─┘   wait has_stopped ── fire ───┘   wait released
//! ```
//!
//! ## Rules
//! - `run`/`start` succeed once per controller; a controller is never reused.
//! - `stop` is idempotent: later calls wait on the same completion.
//! - `stop` on a controller that never started releases it without invoking work.
//! - Never call `stop` from inside the controller's own work: the loop cannot
//!   exit while the invocation waits for it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::config::Config;
use crate::core::coordinator;
use crate::core::latch::Latch;
use crate::core::state::{ControllerState, StateCell};
use crate::core::work_loop;
use crate::error::{ControllerError, LatchError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::WorkErrorPolicy;
use crate::work::{WorkContext, WorkRef};

/// State shared between a controller handle and its work loop.
pub(crate) struct Shared {
    pub(crate) name: Arc<str>,
    pub(crate) work: WorkRef,
    pub(crate) poll_interval: Duration,
    pub(crate) on_work_error: WorkErrorPolicy,
    pub(crate) bus: Bus,
    pub(crate) state: StateCell,
    pub(crate) stop: Latch,
    pub(crate) has_stopped: Latch,
    pub(crate) has_completed: Latch,
    pub(crate) released: Latch,
    /// Set by the one caller allowed to announce and fire `stop`.
    pub(crate) stop_claimed: AtomicBool,
    pub(crate) invocations: AtomicU64,
}

impl Shared {
    pub(crate) fn context(&self, invocation: u64) -> WorkContext {
        WorkContext::new(
            Arc::clone(&self.name),
            invocation,
            self.stop.view(),
            self.has_stopped.view(),
            self.bus.clone(),
        )
    }

    pub(crate) fn publish(&self, kind: EventKind) {
        self.bus
            .publish(Event::new(kind).with_controller(Arc::clone(&self.name)));
    }

    /// Publishes `ProtocolViolation` for a refused latch write.
    ///
    /// Unreachable while `begin` and `release_unstarted` stay exclusive through
    /// the state CAS; kept as a reported assertion instead of a panic.
    pub(crate) fn report_violation(&self, latch: &str, err: LatchError) {
        self.bus.publish(
            Event::new(EventKind::ProtocolViolation)
                .with_controller(Arc::clone(&self.name))
                .with_reason(format!("{latch}: {}", err.as_label())),
        );
    }

    /// Releases the three protocol latches; `released` itself stays writable.
    pub(crate) fn release_latches(&self) {
        self.stop.release();
        self.has_stopped.release();
        self.has_completed.release();
    }
}

/// Handle to a controller. Cloning is cheap and refers to the same controller.
#[derive(Clone)]
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    /// Creates a controller with the default error policy.
    ///
    /// `bus` is where lifecycle events go; pass the process-wide bus created at startup.
    pub fn new(
        name: impl Into<Arc<str>>,
        work: WorkRef,
        poll_interval: Duration,
        bus: Bus,
    ) -> Self {
        Self::builder(name, work)
            .poll_interval(poll_interval)
            .bus(bus)
            .build()
    }

    /// Starts building a controller.
    pub fn builder(name: impl Into<Arc<str>>, work: WorkRef) -> ControllerBuilder {
        ControllerBuilder::new(name.into(), work)
    }

    /// Controller name (used for event correlation).
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    /// Configured work error policy.
    pub fn on_work_error(&self) -> WorkErrorPolicy {
        self.shared.on_work_error
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.shared.state.get()
    }

    /// Number of work invocations so far.
    pub fn invocations(&self) -> u64 {
        self.shared.invocations.load(Ordering::Acquire)
    }

    /// Returns `true` once a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop.is_set()
    }

    /// Returns `true` once the work loop acknowledged its exit.
    pub fn has_stopped(&self) -> bool {
        self.shared.has_stopped.is_set()
    }

    /// Returns `true` once the stop initiator released the run.
    pub fn has_completed(&self) -> bool {
        self.shared.has_completed.is_set()
    }

    /// Returns `true` once teardown finished.
    pub fn is_released(&self) -> bool {
        self.shared.released.is_set()
    }

    /// Completes when the work loop has exited.
    pub async fn stopped(&self) {
        self.shared.has_stopped.wait().await;
    }

    /// Completes when teardown has finished.
    pub async fn released(&self) {
        self.shared.released.wait().await;
    }

    /// The bus this controller publishes to.
    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// Runs the work loop and waits for it to finish.
    ///
    /// Returns after the loop exited (stop requested or work error), the stop
    /// initiator fired `has_completed`, and the latches were released. A work
    /// error is published as [`EventKind::WorkFailed`] and does not make this
    /// call fail.
    ///
    /// The loop runs on its own tokio task. Dropping this future (for example
    /// the losing branch of a `select!`) detaches the loop; `stop` still works.
    pub async fn run(&self) -> Result<(), ControllerError> {
        self.begin()?;
        let handle = tokio::spawn(work_loop::drive(Arc::clone(&self.shared)));
        match handle.await {
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            _ => Ok(()),
        }
    }

    /// Spawns the work loop on the tokio runtime and returns immediately.
    ///
    /// The controller is `Running` when this returns, so a following `stop`
    /// always goes through the full handshake.
    pub fn start(&self) -> Result<(), ControllerError> {
        self.begin()?;
        tokio::spawn(work_loop::drive(Arc::clone(&self.shared)));
        Ok(())
    }

    /// Stops this controller and waits until its teardown completed.
    ///
    /// Idempotent. Equivalent to [`quit_and_wait`](crate::quit_and_wait) on a
    /// batch of one followed by completing the returned guard.
    pub async fn stop(&self) -> Result<(), ControllerError> {
        coordinator::quit_and_wait(std::slice::from_ref(self))
            .await
            .complete()
            .await;
        Ok(())
    }

    fn begin(&self) -> Result<(), ControllerError> {
        self.shared
            .state
            .transition(ControllerState::Created, ControllerState::Running)
            .map_err(|observed| match observed {
                ControllerState::Released => ControllerError::Released {
                    name: self.name().to_string(),
                },
                _ => ControllerError::AlreadyStarted {
                    name: self.name().to_string(),
                },
            })
    }

    /// Publishes `StopRequested` and fires `stop`, once per controller.
    ///
    /// Only the caller winning `stop_claimed` does either, so concurrent stops
    /// announce exactly once and the announcement precedes the signal. A
    /// controller that never started is released on the spot.
    pub(crate) fn request_stop(&self) {
        let shared = &self.shared;
        if shared.stop_claimed.swap(true, Ordering::AcqRel) {
            return;
        }
        shared.publish(EventKind::StopRequested);
        if shared.stop.fire().is_err() {
            return;
        }

        if shared
            .state
            .transition(ControllerState::Created, ControllerState::Released)
            .is_ok()
        {
            self.release_unstarted();
        } else {
            shared.state.advance(ControllerState::Stopping);
        }
    }

    /// Fires `has_completed` on behalf of the stop initiator.
    ///
    /// A repeated completion (idempotent stop) is expected and ignored.
    pub(crate) fn complete(&self) {
        let _ = self.shared.has_completed.fire();
    }

    fn release_unstarted(&self) {
        let shared = &self.shared;
        let _ = shared.has_stopped.fire();
        let _ = shared.has_completed.fire();
        shared.release_latches();
        shared.publish(EventKind::ControllerReleased);
        let _ = shared.released.fire();
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("poll_interval", &self.poll_interval())
            .field("invocations", &self.invocations())
            .finish()
    }
}

/// Builder for [`Controller`].
///
/// ```rust
/// use std::time::Duration;
/// use pollvisor::{Bus, Controller, WorkContext, WorkErrorPolicy, WorkFn, WorkOutcome};
///
/// let bus = Bus::new(256);
/// let ctrl = Controller::builder("janitor", WorkFn::arc(|_ctx: WorkContext| async {
///         Ok(WorkOutcome::Idle)
///     }))
///     .poll_interval(Duration::from_secs(30))
///     .on_work_error(WorkErrorPolicy::Continue)
///     .bus(bus)
///     .build();
///
/// assert_eq!(ctrl.name(), "janitor");
/// ```
pub struct ControllerBuilder {
    name: Arc<str>,
    work: WorkRef,
    poll_interval: Duration,
    on_work_error: WorkErrorPolicy,
    bus: Option<Bus>,
}

impl ControllerBuilder {
    fn new(name: Arc<str>, work: WorkRef) -> Self {
        let cfg = Config::default();
        Self {
            name,
            work,
            poll_interval: cfg.poll_interval,
            on_work_error: cfg.on_work_error,
            bus: None,
        }
    }

    /// Takes poll interval and error policy from `cfg`.
    pub fn config(mut self, cfg: &Config) -> Self {
        self.poll_interval = cfg.poll_interval;
        self.on_work_error = cfg.on_work_error;
        self
    }

    /// Sets the delay between idle invocations.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the work error policy.
    pub fn on_work_error(mut self, policy: WorkErrorPolicy) -> Self {
        self.on_work_error = policy;
        self
    }

    /// Sets the event bus.
    ///
    /// Without one, the controller gets a private bus nobody listens to.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the controller in the `Created` state.
    pub fn build(self) -> Controller {
        Controller {
            shared: Arc::new(Shared {
                name: self.name,
                work: self.work,
                poll_interval: self.poll_interval,
                on_work_error: self.on_work_error,
                bus: self.bus.unwrap_or_default(),
                state: StateCell::new(),
                stop: Latch::new(),
                has_stopped: Latch::new(),
                has_completed: Latch::new(),
                released: Latch::new(),
                stop_claimed: AtomicBool::new(false),
                invocations: AtomicU64::new(0),
            }),
        }
    }
}
