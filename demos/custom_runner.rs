//! # Example: custom_runner
//!
//! A consumer that only knows the [`Runner`] capability.
//!
//! Shows how to:
//! - Hold `Arc<dyn Runner>` instead of a concrete controller.
//! - Swap a single [`Controller`] for a [`ControllerGroup`] without touching the consumer.
//! - Implement [`Runner`] for your own type.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example custom_runner
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pollvisor::{
    Bus, Config, Controller, ControllerError, ControllerGroup, LogWriter, Runner, Subscribe,
    SubscriberSet, WorkContext, WorkFn, WorkOutcome, WorkRef,
};
use tracing_subscriber::EnvFilter;

/// Consumer of a background activity.
struct Service {
    name: &'static str,
    background: Arc<dyn Runner>,
}

impl Service {
    async fn serve_for(&self, d: Duration) -> Result<(), ControllerError> {
        println!("[{}] starting background work", self.name);
        self.background.start()?;
        tokio::time::sleep(d).await;
        self.background.stop().await?;
        println!("[{}] background work stopped", self.name);
        Ok(())
    }
}

/// A runner wrapping a controller and counting how often it was stopped.
struct Audited {
    inner: Controller,
    stops: AtomicU64,
}

#[async_trait]
impl Runner for Audited {
    async fn run(&self) -> Result<(), ControllerError> {
        self.inner.run().await
    }

    fn start(&self) -> Result<(), ControllerError> {
        self.inner.start()
    }

    async fn stop(&self) -> Result<(), ControllerError> {
        self.stops.fetch_add(1, Ordering::Relaxed);
        self.inner.stop().await
    }
}

fn ticker(label: &'static str) -> WorkRef {
    WorkFn::arc(move |ctx: WorkContext| async move {
        println!("[{label}] tick #{}", ctx.invocation());
        Ok(WorkOutcome::Idle)
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config {
        poll_interval: Duration::from_millis(100),
        ..Config::default()
    };
    let bus = Bus::new(cfg.bus_capacity_clamped());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let logs = SubscriberSet::new(subs, &bus);

    let single = Controller::builder("single", ticker("single"))
        .config(&cfg)
        .bus(bus.clone())
        .build();
    Service {
        name: "one",
        background: Arc::new(single),
    }
    .serve_for(Duration::from_millis(250))
    .await?;

    let mut group = ControllerGroup::new(cfg.clone(), bus.clone());
    group.add("left", ticker("left"));
    group.add("right", ticker("right"));
    Service {
        name: "two",
        background: Arc::new(group),
    }
    .serve_for(Duration::from_millis(250))
    .await?;

    let audited = Arc::new(Audited {
        inner: Controller::builder("audited", ticker("audited"))
            .config(&cfg)
            .bus(bus.clone())
            .build(),
        stops: AtomicU64::new(0),
    });
    Service {
        name: "three",
        background: audited.clone(),
    }
    .serve_for(Duration::from_millis(150))
    .await?;
    println!("[main] audited runner was stopped {} time(s)", audited.stops.load(Ordering::Relaxed));

    logs.shutdown().await;
    Ok(())
}
