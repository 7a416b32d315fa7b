//! Driver messages
//!
//! Commands and snapshots for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use super::queue::{PendingTask, TaskTicket};
use crate::config::ConfigUpdate;

/// Errors from throttle operations
#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("Throttle closed")]
    Closed,
}

/// Commands sent to the ThrottleDriver actor
#[derive(Debug)]
pub enum ThrottleCommand {
    /// Enqueue a task for admission
    Submit { task: PendingTask },

    /// Report an in-flight task as finished
    Complete { ticket: TaskTicket },

    /// Change one config field, effective next reconciliation
    Reconfigure { update: ConfigUpdate },

    /// Query current counters
    Snapshot {
        reply: oneshot::Sender<ThrottleState>,
    },
}

/// Point-in-time view of the throttle
#[derive(Debug, Clone)]
pub struct ThrottleState {
    pub active: bool,
    pub in_flight: usize,
    pub queued: usize,
    pub window_len: usize,
    pub rate_bound: bool,
    pub serial_bound: bool,
    pub stats: ThrottleStats,
}

/// Lifetime counters for the throttle
#[derive(Debug, Default, Clone)]
pub struct ThrottleStats {
    pub total_submitted: u64,
    pub total_dispatched: u64,
    pub total_completed: u64,
    pub peak_in_flight: usize,
    pub peak_queued: usize,
    pub drains: u64,
}
