//! Throttle - handle to send commands to the driver

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use super::driver::ThrottleDriver;
use super::messages::{ThrottleCommand, ThrottleError, ThrottleState};
use super::queue::{DispatchAction, PendingTask, TaskTicket};
use crate::config::{ConfigUpdate, ThrottleConfig};
use crate::events::{EventBus, ThrottleEvent};

/// Handle to a running throttle
///
/// Cheap to clone; all clones feed the same driver task. The driver runs
/// until the last handle is dropped, including clones captured by pending
/// [`run`](Throttle::run) tasks, so work in progress keeps it alive.
///
/// Submission and completion are fire-and-forget: when the driver is gone
/// they log a warning and do nothing. Only [`snapshot`](Throttle::snapshot)
/// reports closure to the caller.
#[derive(Clone)]
pub struct Throttle {
    tx: mpsc::UnboundedSender<ThrottleCommand>,
    events: EventBus,
    next_ticket: Arc<AtomicU64>,
}

impl Throttle {
    /// Spawn a throttle driver on the current runtime
    pub fn spawn(config: ThrottleConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventBus::with_default_capacity();
        tokio::spawn(ThrottleDriver::new(config, rx, events.clone()).run());
        debug!("Throttle::spawn: driver task spawned");
        Self {
            tx,
            events,
            next_ticket: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Submit an ungrouped task
    ///
    /// The action runs once the task is admitted, receiving its own ticket;
    /// the caller must later report [`complete`](Throttle::complete) with
    /// that ticket, whatever the task's own outcome. The action must not
    /// block: hand long-running work to its own task.
    pub fn submit<F>(&self, action: F) -> TaskTicket
    where
        F: FnOnce(TaskTicket) + Send + 'static,
    {
        self.enqueue(None, Box::new(action))
    }

    /// Submit a task under a group key
    ///
    /// At most one task per group is in flight at a time; tasks in the same
    /// group dispatch in arrival order.
    pub fn submit_grouped<F>(&self, group: impl Into<String>, action: F) -> TaskTicket
    where
        F: FnOnce(TaskTicket) + Send + 'static,
    {
        self.enqueue(Some(group.into()), Box::new(action))
    }

    fn enqueue(&self, group: Option<String>, action: DispatchAction) -> TaskTicket {
        let ticket = TaskTicket::new(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        debug!(%ticket, group = ?group, "Throttle::submit: called");
        let task = PendingTask::new(ticket, group, action);
        if self.tx.send(ThrottleCommand::Submit { task }).is_err() {
            warn!(%ticket, "Throttle::submit: driver gone, task dropped");
        }
        ticket
    }

    /// Report a previously admitted task as finished
    ///
    /// Exactly once per ticket; repeats and unknown tickets are ignored by
    /// the driver.
    pub fn complete(&self, ticket: TaskTicket) {
        debug!(%ticket, "Throttle::complete: called");
        if self.tx.send(ThrottleCommand::Complete { ticket }).is_err() {
            warn!(%ticket, "Throttle::complete: driver gone");
        }
    }

    /// Run a future as a throttled task
    ///
    /// Admission spawns the future; completion is reported automatically
    /// when it finishes. This is the ergonomic wrapper over the
    /// `submit`/`complete` pair.
    pub fn run<F>(&self, group: Option<String>, future: F) -> TaskTicket
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.clone();
        let action = move |ticket: TaskTicket| {
            tokio::spawn(async move {
                future.await;
                handle.complete(ticket);
            });
        };
        match group {
            Some(group) => self.submit_grouped(group, action),
            None => self.submit(action),
        }
    }

    /// Apply a config update; the driver reconciles immediately after
    pub fn reconfigure(&self, update: ConfigUpdate) {
        debug!(?update, "Throttle::reconfigure: called");
        if self.tx.send(ThrottleCommand::Reconfigure { update }).is_err() {
            warn!("Throttle::reconfigure: driver gone");
        }
    }

    /// Stop admitting tasks; in-flight tasks are unaffected
    pub fn pause(&self) {
        self.reconfigure(ConfigUpdate::Active(false));
    }

    /// Resume admission, flushing whatever became eligible while paused
    pub fn resume(&self) {
        self.reconfigure(ConfigUpdate::Active(true));
    }

    /// Subscribe to Sent/Received/Drained events
    pub fn subscribe(&self) -> broadcast::Receiver<ThrottleEvent> {
        self.events.subscribe()
    }

    /// Query current counters
    ///
    /// Commands are processed in order, so awaiting a snapshot is also a
    /// barrier: everything submitted before it has been reconciled by the
    /// time the reply arrives.
    pub async fn snapshot(&self) -> Result<ThrottleState, ThrottleError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ThrottleCommand::Snapshot { reply })
            .map_err(|_| ThrottleError::Closed)?;
        rx.await.map_err(|_| ThrottleError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(rate: u32, rate_per_ms: u64, concurrent: usize) -> ThrottleConfig {
        ThrottleConfig {
            active: true,
            rate,
            rate_per_ms,
            concurrent,
        }
    }

    #[tokio::test]
    async fn test_spawn_and_snapshot() {
        let throttle = Throttle::spawn(ThrottleConfig::default());
        let state = throttle.snapshot().await.unwrap();
        assert!(state.active);
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.queued, 0);
        assert_eq!(state.stats.total_submitted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_dispatches_within_limits() {
        let throttle = Throttle::spawn(config(100, 60_000, 2));
        for _ in 0..3 {
            throttle.submit(|_| {});
        }
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.in_flight, 2);
        assert_eq!(state.queued, 1);
        assert_eq!(state.stats.total_submitted, 3);
        assert_eq!(state.stats.total_dispatched, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_frees_slot() {
        let throttle = Throttle::spawn(config(100, 60_000, 1));
        let first = throttle.submit(|_| {});
        throttle.submit(|_| {});

        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.in_flight, 1);
        assert_eq!(state.queued, 1);

        throttle.complete(first);
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.in_flight, 1);
        assert_eq!(state.queued, 0);
        assert_eq!(state.stats.total_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_completion() {
        let throttle = Throttle::spawn(ThrottleConfig::default());
        let mut events = throttle.subscribe();
        for _ in 0..3 {
            throttle.run(None, async {});
        }

        loop {
            if let ThrottleEvent::Drained = events.recv().await.unwrap() {
                break;
            }
        }
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.stats.total_dispatched, 3);
        assert_eq!(state.stats.total_completed, 3);
        assert_eq!(state.stats.drains, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_blocks_dispatch_until_resume() {
        let throttle = Throttle::spawn(ThrottleConfig::default());
        throttle.pause();
        throttle.submit(|_| {});

        let state = throttle.snapshot().await.unwrap();
        assert!(!state.active);
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.queued, 1);

        throttle.resume();
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.in_flight, 1);
        assert_eq!(state.queued, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grouped_submission_serializes() {
        let throttle = Throttle::spawn(ThrottleConfig::default());
        let first = throttle.submit_grouped("g", |_| {});
        throttle.submit_grouped("g", |_| {});

        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.in_flight, 1);
        assert_eq!(state.queued, 1);
        assert!(state.serial_bound);

        throttle.complete(first);
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.in_flight, 1);
        assert_eq!(state.queued, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_timer_admits_after_window() {
        let throttle = Throttle::spawn(config(2, 1_000, 10));
        for _ in 0..4 {
            throttle.submit(|_| {});
        }
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.stats.total_dispatched, 2);
        assert!(state.rate_bound);

        tokio::time::advance(Duration::from_millis(1_002)).await;
        let state = throttle.snapshot().await.unwrap();
        assert_eq!(state.stats.total_dispatched, 4);
        assert_eq!(state.queued, 0);
    }

    #[tokio::test]
    async fn test_tickets_unique_across_clones() {
        let throttle = Throttle::spawn(ThrottleConfig::default());
        let clone = throttle.clone();
        let a = throttle.submit(|_| {});
        let b = clone.submit(|_| {});
        assert_ne!(a, b);
    }
}
