//! # Example: batch_shutdown
//!
//! Stops ten controllers with different shutdown delays as one batch.
//!
//! Shows how to:
//! - Signal every stop first, then wait: total time is the slowest, not the sum.
//! - Use the [`Quiesced`] window for final bookkeeping before teardown.
//! - Bound a shutdown with [`stop_all_within`] and get the stuck names back.
//!
//! ## Run
//! ```bash
//! cargo run --example batch_shutdown
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use pollvisor::{
    Bus, Controller, LogWriter, Quiesced, RuntimeError, Subscribe, SubscriberSet, WorkContext,
    WorkFn, WorkOutcome, quit_and_wait, stop_all_within,
};
use tracing_subscriber::EnvFilter;

/// Work that takes `linger` to wind down once a stop is requested.
fn lingering(name: String, linger: Duration, bus: &Bus) -> Controller {
    let work = WorkFn::arc(move |ctx: WorkContext| async move {
        tokio::select! {
            _ = ctx.stopped() => tokio::time::sleep(linger).await,
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
        Ok(WorkOutcome::Idle)
    });
    Controller::new(name, work, Duration::from_millis(50), bus.clone())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let bus = Bus::new(1024);
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let logs = SubscriberSet::new(subs, &bus);

    let ctrls: Vec<Controller> = (0..10u64)
        .map(|i| lingering(format!("worker-{i}"), Duration::from_millis(i * 50), &bus))
        .collect();
    for c in &ctrls {
        c.start()?;
    }
    tokio::time::sleep(Duration::from_millis(250)).await;

    let started = Instant::now();
    let quiesced: Quiesced = quit_and_wait(&ctrls).await;
    let total: u64 = quiesced.controllers().iter().map(|c| c.invocations()).sum();
    println!(
        "[main] all loops exited after {:?}; {total} invocations in total",
        started.elapsed()
    );
    quiesced.complete().await;
    println!("[main] batch released after {:?}", started.elapsed());

    let quick = lingering("quick".into(), Duration::ZERO, &bus);
    let stubborn = Controller::new(
        "stubborn",
        WorkFn::arc(|_ctx: WorkContext| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(WorkOutcome::Idle)
        }),
        Duration::from_millis(50),
        bus.clone(),
    );
    quick.start()?;
    stubborn.start()?;
    tokio::time::sleep(Duration::from_millis(10)).await;

    match stop_all_within(&[quick, stubborn.clone()], Duration::from_millis(300)).await {
        Ok(()) => println!("[main] everything stopped in time"),
        Err(RuntimeError::GraceExceeded { grace, stuck }) => {
            println!("[main] grace {grace:?} exceeded, stuck: {stuck:?}");
        }
        Err(e) => return Err(e.into()),
    }
    stubborn.released().await;
    println!("[main] stubborn finished its last call and was released");

    logs.shutdown().await;
    Ok(())
}
