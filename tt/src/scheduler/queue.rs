//! Pending queue and serial-group bookkeeping

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a submitted task
///
/// Tickets are handed out at submission and passed back on completion.
/// They are never reused within one throttle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskTicket(u64);

impl TaskTicket {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric id
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TaskTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskTicket({})", self.0)
    }
}

impl fmt::Display for TaskTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked when a task is admitted
///
/// Receives the task's own ticket so the caller can report completion.
pub type DispatchAction = Box<dyn FnOnce(TaskTicket) + Send + 'static>;

/// A task waiting for admission
pub struct PendingTask {
    pub ticket: TaskTicket,
    pub group: Option<String>,
    pub action: DispatchAction,
}

impl PendingTask {
    /// Create a new pending task
    pub fn new(ticket: TaskTicket, group: Option<String>, action: DispatchAction) -> Self {
        Self { ticket, group, action }
    }
}

impl fmt::Debug for PendingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTask")
            .field("ticket", &self.ticket)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// FIFO queue of tasks waiting for admission
///
/// Selection is split from removal so a blocked head never wedges the queue:
/// `select_eligible` finds the first admissible task, `commit` removes it and
/// locks its group in one step.
#[derive(Debug, Default)]
pub struct PendingQueue {
    tasks: VecDeque<PendingTask>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task in arrival order
    pub fn push(&mut self, task: PendingTask) {
        self.tasks.push_back(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Find the first task whose group is not busy
    ///
    /// Tasks without a group are always eligible.
    pub fn select_eligible(&self, locks: &GroupLocks) -> Option<usize> {
        self.tasks.iter().position(|task| match &task.group {
            Some(group) => !locks.is_busy(group),
            None => true,
        })
    }

    /// Remove the task at `index` and mark its group busy
    pub fn commit(&mut self, index: usize, locks: &mut GroupLocks) -> Option<PendingTask> {
        let task = self.tasks.remove(index)?;
        if let Some(group) = &task.group {
            locks.lock(group);
        }
        Some(task)
    }
}

/// Set of groups with a task currently in flight
///
/// At most one task per group runs at a time; later tasks in the same group
/// wait in the queue until the group is released.
#[derive(Debug, Default)]
pub struct GroupLocks {
    busy: HashSet<String>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, group: &str) -> bool {
        self.busy.contains(group)
    }

    pub fn lock(&mut self, group: &str) {
        self.busy.insert(group.to_string());
    }

    /// Free a group; returns false if it was not held
    pub fn release(&mut self, group: &str) -> bool {
        self.busy.remove(group)
    }
}
