//! # ControllerGroup: several controllers run and stopped as one unit.
//!
//! Every controller added through the group shares one [`Config`] and one
//! [`Bus`]. Stopping the group goes through the batch coordinator, so the
//! group stops in the time of its slowest member.
//!
//! ```rust
//! use std::sync::Arc;
//! use pollvisor::{Bus, Config, ControllerGroup, Runner, WorkContext, WorkFn, WorkOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = Bus::new(64);
//! let mut group = ControllerGroup::new(Config::default(), bus);
//! group.add("a", WorkFn::arc(|_ctx: WorkContext| async { Ok(WorkOutcome::Idle) }));
//! group.add("b", WorkFn::arc(|_ctx: WorkContext| async { Ok(WorkOutcome::Idle) }));
//!
//! let runner: Arc<dyn Runner> = Arc::new(group);
//! runner.start().unwrap();
//! runner.stop().await.unwrap();
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::core::controller::Controller;
use crate::core::coordinator;
use crate::error::{ControllerError, RuntimeError};
use crate::events::Bus;
use crate::runner::Runner;
use crate::work::WorkRef;

/// A set of controllers built against one config and one bus.
#[derive(Debug)]
pub struct ControllerGroup {
    cfg: Config,
    bus: Bus,
    controllers: Vec<Controller>,
}

impl ControllerGroup {
    /// Creates an empty group.
    pub fn new(cfg: Config, bus: Bus) -> Self {
        Self {
            cfg,
            bus,
            controllers: Vec::new(),
        }
    }

    /// Builds a controller from the group config and adds it.
    ///
    /// Returns a handle to the new controller.
    pub fn add(&mut self, name: impl Into<Arc<str>>, work: WorkRef) -> Controller {
        let ctrl = Controller::builder(name, work)
            .config(&self.cfg)
            .bus(self.bus.clone())
            .build();
        self.controllers.push(ctrl.clone());
        ctrl
    }

    /// Adds an already built controller.
    pub fn push(&mut self, ctrl: Controller) {
        self.controllers.push(ctrl);
    }

    /// Number of controllers in the group.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// True when no controller was added.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Controller names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.controllers
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Controllers in insertion order.
    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    /// Group bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Starts every controller.
    ///
    /// A controller that refuses to start does not prevent the others from
    /// starting; the first refusal is returned.
    pub fn start(&self) -> Result<(), ControllerError> {
        let mut first_err = None;
        for ctrl in &self.controllers {
            if let Err(e) = ctrl.start() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Starts every controller and waits until all of them were torn down.
    pub async fn run(&self) -> Result<(), ControllerError> {
        self.start()?;
        for ctrl in &self.controllers {
            ctrl.released().await;
        }
        Ok(())
    }

    /// Stops every controller (see [`coordinator::stop_all`]).
    pub async fn stop(&self) -> Result<(), ControllerError> {
        coordinator::stop_all(&self.controllers).await;
        Ok(())
    }

    /// Stops every controller, bounded by `cfg.grace` (zero means unlimited).
    pub async fn stop_within(&self) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace_limit().unwrap_or(Duration::ZERO);
        coordinator::stop_all_within(&self.controllers, grace).await
    }
}

#[async_trait]
impl Runner for ControllerGroup {
    async fn run(&self) -> Result<(), ControllerError> {
        ControllerGroup::run(self).await
    }

    fn start(&self) -> Result<(), ControllerError> {
        ControllerGroup::start(self)
    }

    async fn stop(&self) -> Result<(), ControllerError> {
        ControllerGroup::stop(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::{WorkContext, WorkFn, WorkOutcome};

    fn idle() -> WorkRef {
        WorkFn::arc(|_ctx: WorkContext| async { Ok(WorkOutcome::Idle) })
    }

    #[test]
    fn test_add_applies_group_config() {
        let cfg = Config {
            poll_interval: Duration::from_millis(40),
            ..Config::default()
        };
        let mut group = ControllerGroup::new(cfg, Bus::new(8));
        assert!(group.is_empty());
        let a = group.add("a", idle());
        group.add("b", idle());

        assert_eq!(a.poll_interval(), Duration::from_millis(40));
        assert_eq!(group.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(group.len(), 2);
        assert!(!group.is_empty());
        assert_eq!(group.controllers()[0].name(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reports_refusal_but_starts_the_rest() {
        let mut group = ControllerGroup::new(Config::default(), Bus::new(8));
        let early = group.add("early", idle());
        let late = group.add("late", idle());
        early.start().unwrap();

        assert_eq!(
            group.start(),
            Err(ControllerError::AlreadyStarted {
                name: "early".into()
            })
        );
        assert_eq!(late.state(), crate::ControllerState::Running);
        group.stop().await.unwrap();
    }
}
