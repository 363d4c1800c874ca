//! # Runner capability.
//!
//! [`Runner`] is what a consumer of a background activity needs: run it in
//! place, start it in the background, stop it. [`Controller`] is the canonical
//! implementation and [`ControllerGroup`](crate::ControllerGroup) runs a set
//! of controllers behind the same interface.
//!
//! ```text
//! consumer ── Arc<dyn Runner> ──┬─► Controller       (one work loop)
//!                               └─► ControllerGroup  (many, stopped as a batch)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pollvisor::{Bus, Controller, Runner, WorkContext, WorkFn, WorkOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctrl = Controller::new(
//!     "heartbeat",
//!     WorkFn::arc(|_ctx: WorkContext| async { Ok(WorkOutcome::Idle) }),
//!     Duration::from_millis(100),
//!     Bus::new(64),
//! );
//! let runner: Arc<dyn Runner> = Arc::new(ctrl);
//! runner.start().unwrap();
//! runner.stop().await.unwrap();
//! # }
//! ```

use async_trait::async_trait;

use crate::core::Controller;
use crate::error::ControllerError;

/// Something that can be run in place, started in the background and stopped.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runs until stopped and torn down.
    async fn run(&self) -> Result<(), ControllerError>;

    /// Starts in the background and returns immediately.
    fn start(&self) -> Result<(), ControllerError>;

    /// Stops and waits for teardown. Idempotent.
    async fn stop(&self) -> Result<(), ControllerError>;
}

#[async_trait]
impl Runner for Controller {
    async fn run(&self) -> Result<(), ControllerError> {
        Controller::run(self).await
    }

    fn start(&self) -> Result<(), ControllerError> {
        Controller::start(self)
    }

    async fn stop(&self) -> Result<(), ControllerError> {
        Controller::stop(self).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use crate::core::ControllerGroup;
    use crate::events::Bus;
    use crate::work::{WorkContext, WorkFn, WorkOutcome, WorkRef};

    fn idle() -> WorkRef {
        WorkFn::arc(|_ctx: WorkContext| async { Ok(WorkOutcome::Idle) })
    }

    async fn start_then_stop(runner: Arc<dyn Runner>) -> Result<(), ControllerError> {
        runner.start()?;
        tokio::time::sleep(Duration::from_millis(20)).await;
        runner.stop().await
    }

    #[tokio::test(start_paused = true)]
    async fn test_group_substitutes_for_controller() {
        let bus = Bus::new(64);
        let single = Controller::new("single", idle(), Duration::from_millis(50), bus.clone());

        let mut group = ControllerGroup::new(Config::default(), bus);
        let a = group.add("a", idle());
        let b = group.add("b", idle());

        start_then_stop(Arc::new(single.clone())).await.unwrap();
        start_then_stop(Arc::new(group)).await.unwrap();

        assert!(single.is_released());
        assert!(a.is_released() && b.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn test_group_run_returns_after_stop() {
        let mut group = ControllerGroup::new(Config::default(), Bus::new(64));
        let a = group.add("a", idle());
        let group: Arc<dyn Runner> = Arc::new(group);

        let running = Arc::clone(&group);
        let handle = tokio::spawn(async move { running.run().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!a.has_stopped());

        group.stop().await.unwrap();
        assert_eq!(handle.await.unwrap(), Ok(()));
    }
}
