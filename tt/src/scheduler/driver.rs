//! Cycle driver - the actor that owns all scheduler state
//!
//! Submissions, completions, and config updates arrive as commands on an
//! mpsc channel; the rate-window wake-up is a timer arm in the same select
//! loop. Every external event is serialized through the channel, so
//! reconciliation can never re-enter itself mid-pass.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::messages::{ThrottleCommand, ThrottleState, ThrottleStats};
use super::queue::{GroupLocks, PendingQueue, PendingTask, TaskTicket};
use super::window::DispatchWindow;
use crate::config::{ConfigUpdate, ThrottleConfig};
use crate::events::EventBus;

/// Pad added to the rate timer so the window has truly elapsed when it fires
const REARM_PAD: Duration = Duration::from_millis(1);

/// Single-owner scheduler state machine
///
/// Admits queued tasks while pause state, concurrency headroom, the rate
/// window, and group exclusivity all allow; keeps at most one timer armed,
/// and only when the rate window is the sole blocker. Completions re-open
/// every other constraint, so they need no timer.
pub struct ThrottleDriver {
    config: ThrottleConfig,
    rx: mpsc::UnboundedReceiver<ThrottleCommand>,
    events: EventBus,
    queue: PendingQueue,
    groups: GroupLocks,
    window: DispatchWindow,
    /// Admitted tasks awaiting completion, with the group each one holds
    in_flight: HashMap<TaskTicket, Option<String>>,
    /// At most one pending wake-up; None means sleep until the next command
    deadline: Option<Instant>,
    stats: ThrottleStats,
}

impl ThrottleDriver {
    pub fn new(config: ThrottleConfig, rx: mpsc::UnboundedReceiver<ThrottleCommand>, events: EventBus) -> Self {
        Self {
            config,
            rx,
            events,
            queue: PendingQueue::new(),
            groups: GroupLocks::new(),
            window: DispatchWindow::new(),
            in_flight: HashMap::new(),
            deadline: None,
            stats: ThrottleStats::default(),
        }
    }

    /// Run the driver until every handle is dropped
    ///
    /// Consumes the driver. Exits when the command channel closes; queued
    /// tasks still waiting at that point are dropped with the driver.
    pub async fn run(mut self) {
        info!(
            rate = self.config.rate,
            rate_per_ms = self.config.rate_per_ms,
            concurrent = self.config.concurrent,
            "Throttle driver started"
        );

        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;

                _ = async {
                    match deadline {
                        Some(at) => time::sleep_until(at).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    self.handle_timer();
                }

                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break,
                    }
                }
            }
        }

        info!("Throttle driver stopped");
    }

    fn handle_command(&mut self, cmd: ThrottleCommand) {
        match cmd {
            ThrottleCommand::Submit { task } => self.handle_submit(task),
            ThrottleCommand::Complete { ticket } => self.handle_complete(ticket),
            ThrottleCommand::Reconfigure { update } => self.handle_reconfigure(update),
            ThrottleCommand::Snapshot { reply } => self.handle_snapshot(reply),
        }
    }

    fn handle_submit(&mut self, task: PendingTask) {
        debug!(ticket = %task.ticket, group = ?task.group, "ThrottleDriver::submit: task queued");
        self.queue.push(task);
        self.stats.total_submitted += 1;
        self.stats.peak_queued = self.stats.peak_queued.max(self.queue.len());
        self.reconcile();
    }

    fn handle_complete(&mut self, ticket: TaskTicket) {
        let Some(group) = self.in_flight.remove(&ticket) else {
            warn!(%ticket, "ThrottleDriver::complete: unknown or already-completed ticket, ignoring");
            return;
        };
        if let Some(ref group) = group {
            self.groups.release(group);
        }
        self.stats.total_completed += 1;
        debug!(%ticket, in_flight = self.in_flight.len(), "ThrottleDriver::complete: slot released");
        self.events.received(ticket, group);

        if self.queue.is_empty() && self.in_flight.is_empty() {
            self.stats.drains += 1;
            debug!("ThrottleDriver::complete: drained");
            self.events.drained();
        }

        self.reconcile();
    }

    fn handle_reconfigure(&mut self, update: ConfigUpdate) {
        debug!(?update, "ThrottleDriver::reconfigure: applying update");
        update.apply(&mut self.config);
        self.reconcile();
    }

    fn handle_snapshot(&self, reply: oneshot::Sender<ThrottleState>) {
        let now = Instant::now();
        let rate = self.config.rate as usize;
        let state = ThrottleState {
            active: self.config.active,
            in_flight: self.in_flight.len(),
            queued: self.queue.len(),
            window_len: self.window.len(),
            rate_bound: !self.queue.is_empty() && self.window.is_rate_bound(now, rate, self.config.rate_per()),
            serial_bound: !self.queue.is_empty() && self.queue.select_eligible(&self.groups).is_none(),
            stats: self.stats.clone(),
        };
        let _ = reply.send(state);
    }

    fn handle_timer(&mut self) {
        debug!("ThrottleDriver::timer: rate window reopened");
        self.deadline = None;
        self.reconcile();
    }

    /// Drain everything currently admissible, then re-arm the timer if the
    /// rate window is what stopped the drain
    fn reconcile(&mut self) {
        self.deadline = None;
        self.window.trim(self.config.rate as usize);

        loop {
            let now = Instant::now();
            if !self.can_admit(now) {
                break;
            }
            let Some(index) = self.queue.select_eligible(&self.groups) else {
                // serial-bound: capacity may remain but nothing is eligible
                break;
            };
            let Some(task) = self.queue.commit(index, &mut self.groups) else {
                break;
            };
            self.dispatch(task, now);
        }

        self.arm_if_rate_blocked();
    }

    /// Pure admission predicate, recomputed on every loop iteration
    ///
    /// A zero rate is a zero dispatch budget, checked explicitly because an
    /// always-empty window can never report itself as bound.
    fn can_admit(&self, now: Instant) -> bool {
        self.config.active
            && self.config.rate > 0
            && self.in_flight.len() < self.config.concurrent
            && !self.window.is_rate_bound(now, self.config.rate as usize, self.config.rate_per())
            && !self.queue.is_empty()
    }

    fn dispatch(&mut self, task: PendingTask, now: Instant) {
        let PendingTask { ticket, group, action } = task;
        debug!(%ticket, group = ?group, "ThrottleDriver::dispatch: task admitted");
        action(ticket);
        self.window.record(now, self.config.rate as usize);
        self.in_flight.insert(ticket, group.clone());
        self.stats.total_dispatched += 1;
        self.stats.peak_in_flight = self.stats.peak_in_flight.max(self.in_flight.len());
        self.events.sent(ticket, group);
    }

    /// Arm the wake-up timer iff the rate window is the only blocker
    ///
    /// Paused, concurrency-saturated, and serial-bound states arm nothing:
    /// each of those is re-opened by a future command, not by time passing.
    fn arm_if_rate_blocked(&mut self) {
        let now = Instant::now();
        let rate = self.config.rate as usize;
        let rate_per = self.config.rate_per();

        let only_rate_blocks = self.config.active
            && self.in_flight.len() < self.config.concurrent
            && self.window.is_rate_bound(now, rate, rate_per)
            && self.queue.select_eligible(&self.groups).is_some();

        if only_rate_blocks {
            let delay = self.window.time_until_free(now, rate_per) + REARM_PAD;
            self.deadline = Some(now + delay);
            debug!(
                delay_ms = delay.as_millis() as u64,
                "ThrottleDriver::reconcile: rate timer armed"
            );
        }
    }
}
