//! # Example: basic_controller
//!
//! One controller draining an in-memory queue.
//!
//! Shows how to:
//! - Write work as a closure with [`WorkFn`] that reports `Worked`/`Idle`.
//! - Inject a [`Bus`] and route its events to `tracing` through [`LogWriter`].
//! - Stop the controller and flush the log pipeline.
//!
//! ## Flow
//! ```text
//! producer ──push──► queue ◄──pop── drain work (Worked: again now, Idle: wait 200ms)
//! main ── ctrl.stop() ──► StopRequested ─► LoopExited ─► ControllerStopped ─► ControllerReleased
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example basic_controller
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pollvisor::{
    Bus, Config, Controller, LogWriter, Subscribe, SubscriberSet, WorkContext, WorkFn, WorkOutcome,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cfg = Config {
        poll_interval: Duration::from_millis(200),
        ..Config::default()
    };
    let bus = Bus::new(cfg.bus_capacity_clamped());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let logs = SubscriberSet::new(subs, &bus);

    let queue: Arc<Mutex<VecDeque<u32>>> = Arc::default();
    let work = {
        let queue = Arc::clone(&queue);
        WorkFn::arc(move |ctx: WorkContext| {
            let item = queue.lock().map(|mut q| q.pop_front()).unwrap_or(None);
            async move {
                match item {
                    Some(n) => {
                        println!(
                            "[{}] processed item {n} (call #{})",
                            ctx.controller(),
                            ctx.invocation()
                        );
                        Ok(WorkOutcome::Worked)
                    }
                    None => Ok(WorkOutcome::Idle),
                }
            }
        })
    };

    let ctrl = Controller::builder("drain", work)
        .config(&cfg)
        .bus(bus.clone())
        .build();
    ctrl.start()?;

    for batch in 0..3u32 {
        if let Ok(mut q) = queue.lock() {
            q.extend(batch * 10..batch * 10 + 3);
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    ctrl.stop().await?;
    println!(
        "[main] state={} invocations={}",
        ctrl.state().as_label(),
        ctrl.invocations()
    );

    logs.shutdown().await;
    Ok(())
}
