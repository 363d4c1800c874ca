//! # SubscriberSet: bus listener plus one queue per subscriber.
//!
//! ```text
//! Bus ──► listener task ──► fan_out ──┬──► [queue a] ──► worker a ──► a.on_event()
//!                                     ├──► [queue b] ──► worker b ──► b.on_event()
//!                                     └──► [queue n] ──► worker n ──► n.on_event()
//!                                            full/closed ──► SubscriberOverflow
//!                                            panic       ──► SubscriberPanicked
//! ```
//!
//! Publishers never wait on subscribers. Each subscriber sees events in
//! publish order; there is no ordering across subscribers. [`SubscriberSet::shutdown`]
//! drains what the bus still holds for the listener before closing the queues,
//! so the last lifecycle events of a shutdown are not lost.
//!
//! Panics are caught with `AssertUnwindSafe`: a subscriber that panics while
//! holding a lock of its own may leave that state poisoned.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Sending side of one subscriber queue.
#[derive(Clone)]
struct Lane {
    subscriber: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Delivers bus events to a fixed list of subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    listener: JoinHandle<()>,
    stop: CancellationToken,
    bus: Bus,
}

impl SubscriberSet {
    /// Subscribes to `bus` and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime. Only events published after this
    /// call are delivered.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: &Bus) -> Self {
        let (lanes, workers): (Vec<Lane>, Vec<JoinHandle<()>>) =
            subs.into_iter().map(|sub| spawn_worker(sub, bus)).unzip();

        let stop = CancellationToken::new();
        let listener = spawn_listener(bus, lanes.clone(), stop.clone());

        Self {
            lanes,
            workers,
            listener,
            stop,
            bus: bus.clone(),
        }
    }

    /// Hands `event` to every subscriber queue without going through the bus.
    pub fn emit(&self, event: &Event) {
        fan_out(&self.lanes, &self.bus, Arc::new(event.clone()));
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True when no subscriber is attached.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Stops listening, drains buffered events, then waits for every worker
    /// to finish its queue.
    pub async fn shutdown(self) {
        self.stop.cancel();
        let _ = self.listener.await;
        drop(self.lanes);

        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Spawns the worker draining one subscriber's queue.
fn spawn_worker(sub: Arc<dyn Subscribe>, bus: &Bus) -> (Lane, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
    let lane = Lane {
        subscriber: sub.name(),
        tx,
    };
    let bus = bus.clone();

    let worker = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let delivery = std::panic::AssertUnwindSafe(sub.on_event(&ev)).catch_unwind();
            if let Err(panic) = delivery.await {
                // A panic while handling a panic report is not reported again.
                if ev.kind == EventKind::SubscriberPanicked {
                    continue;
                }
                bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*panic)));
            }
        }
    });
    (lane, worker)
}

/// Forwards bus events to the subscriber queues until `stop` fires.
fn spawn_listener(bus: &Bus, lanes: Vec<Lane>, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    let bus = bus.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => fan_out(&lanes, &bus, Arc::new(ev)),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                },
                _ = stop.cancelled() => break,
            }
        }

        loop {
            match rx.try_recv() {
                Ok(ev) => fan_out(&lanes, &bus, Arc::new(ev)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}

/// Offers `event` to every lane with `try_send`.
///
/// Drops are reported as `SubscriberOverflow`, except drops of overflow events.
/// A `SubscriberPanicked` event is not offered to the subscriber it names.
fn fan_out(lanes: &[Lane], bus: &Bus, event: Arc<Event>) {
    let report = event.kind != EventKind::SubscriberOverflow;
    let panicked = match event.kind {
        EventKind::SubscriberPanicked => event.controller.as_deref(),
        _ => None,
    };

    for lane in lanes {
        if panicked == Some(lane.subscriber) {
            continue;
        }
        let why = match lane.tx.try_send(Arc::clone(&event)) {
            Ok(()) => continue,
            Err(mpsc::error::TrySendError::Full(_)) => "full",
            Err(mpsc::error::TrySendError::Closed(_)) => "closed",
        };
        if report {
            bus.publish(Event::subscriber_overflow(lane.subscriber, why));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber blew up");
        }

        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    /// Panics on every event and counts how often it was called.
    struct CountingPanicky {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Subscribe for CountingPanicky {
        async fn on_event(&self, _event: &Event) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("{} blew up", self.name);
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_shutdown_flushes_buffered_events() {
        let bus = Bus::new(16);
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone()], &bus);

        bus.publish(Event::new(EventKind::StopRequested).with_controller("a"));
        bus.publish(Event::new(EventKind::ControllerStopped).with_controller("a"));
        set.shutdown().await;

        let seen = rec.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![EventKind::StopRequested, EventKind::ControllerStopped]
        );
    }

    #[tokio::test]
    async fn test_panicking_subscriber_is_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicky)], &bus);

        set.emit(&Event::new(EventKind::ControllerStarting));

        let ev = loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::SubscriberPanicked {
                break ev;
            }
        };
        assert_eq!(ev.controller.as_deref(), Some("panicky"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
        set.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_reports_do_not_feed_back_into_panicking_subscribers() {
        let bus = Bus::new(1024);
        let calls = Arc::new(AtomicUsize::new(0));
        let subs: Vec<Arc<dyn Subscribe>> = vec![
            Arc::new(CountingPanicky {
                name: "left",
                calls: calls.clone(),
            }),
            Arc::new(CountingPanicky {
                name: "right",
                calls: calls.clone(),
            }),
        ];
        let set = SubscriberSet::new(subs, &bus);

        bus.publish(Event::new(EventKind::ControllerStarting).with_controller("a"));
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        // One call each for the event, then one each for the other's report.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        set.shutdown().await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
