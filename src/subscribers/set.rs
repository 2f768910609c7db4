//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! - `emit` returns immediately; per-subscriber order is FIFO.
//! - No ordering across subscribers, no retries on overflow.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use super::Subscribe;
use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};

/// Queue and worker of one subscriber.
struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

impl Lane {
    /// Spawns the worker draining this subscriber's queue in FIFO order.
    ///
    /// A panic in `on_event` is reported on the bus; the worker keeps going.
    fn spawn(sub: Arc<dyn Subscribe>, bus: Bus) -> Self {
        let name = sub.name();
        let (queue, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                    .catch_unwind()
                    .await;
                if let Err(payload) = handled {
                    let info = panic_message(payload.as_ref());
                    warn!(subscriber = name, info = %info, "subscriber panicked");
                    bus.publish(Event::subscriber_panicked(name, info));
                }
            }
        });

        Self {
            name,
            queue,
            worker,
        }
    }

    /// Queues `ev` without waiting; returns the drop reason when it does not fit.
    fn offer(&self, ev: &Arc<Event>) -> Option<&'static str> {
        match self.queue.try_send(Arc::clone(ev)) {
            Ok(()) => None,
            Err(mpsc::error::TrySendError::Full(_)) => Some("full"),
            Err(mpsc::error::TrySendError::Closed(_)) => Some("closed"),
        }
    }
}

/// Fan-out over subscribers, each with its own bounded queue and worker task.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| Lane::spawn(sub, bus.clone()))
            .collect();
        Self { lanes, bus }
    }

    /// Hands one event to every subscriber queue (non-blocking).
    ///
    /// A full or closed queue drops the event for that subscriber and publishes
    /// `SubscriberOverflow`, except when the dropped event is itself an overflow report.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            let Some(reason) = lane.offer(&ev) else {
                continue;
            };
            if event.kind != EventKind::SubscriberOverflow {
                self.bus
                    .publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes all queues and waits until every worker has drained its backlog.
    pub async fn shutdown(self) {
        let workers: Vec<_> = self
            .lanes
            .into_iter()
            .map(|Lane { queue, worker, .. }| {
                drop(queue);
                worker
            })
            .collect();
        for worker in workers {
            let _ = worker.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

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

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    #[tokio::test]
    async fn test_fan_out_in_order() {
        let bus = Bus::new(16);
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone()], bus);

        set.emit(&Event::new(EventKind::ControllerStarted));
        set.emit(&Event::new(EventKind::SignalHandled));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![EventKind::ControllerStarted, EventKind::SignalHandled]
        );
    }

    #[tokio::test]
    async fn test_panic_is_reported_on_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicker)], bus);

        set.emit(&Event::new(EventKind::SignalHandled));
        set.shutdown().await;

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.item.as_deref(), Some("panicker"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    struct Narrow;

    #[async_trait]
    impl Subscribe for Narrow {
        async fn on_event(&self, _event: &Event) {}

        fn name(&self) -> &'static str {
            "narrow"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_full_queue_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Narrow)], bus);

        // worker has not run yet: the second event does not fit
        set.emit(&Event::new(EventKind::SignalHandled));
        set.emit(&Event::new(EventKind::SignalHandled));
        set.emit(&Event::subscriber_overflow("narrow", "full"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.item.as_deref(), Some("narrow"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
        assert!(rx.try_recv().is_err());
        set.shutdown().await;
    }
}
