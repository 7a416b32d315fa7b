//! Admission scheduling with the actor pattern
//!
//! The driver task owns all scheduler state and processes commands via
//! channels; a task is admitted only when four constraints agree:
//! - **Pause state:** the throttle is active
//! - **Concurrency:** fewer than `concurrent` tasks in flight
//! - **Rate window:** fewer than `rate` dispatches in the last `rate_per_ms`
//! - **Group exclusivity:** no in-flight task holds the same group key

mod driver;
mod handle;
mod messages;
mod queue;
mod window;

pub use handle::Throttle;
pub use messages::{ThrottleError, ThrottleState, ThrottleStats};
pub use queue::TaskTicket;
