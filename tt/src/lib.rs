//! TaskThrottle - admission scheduler for outbound tasks
//!
//! Decides *when* each submitted task may run under three simultaneous
//! constraints: a maximum dispatch rate per rolling time window, a maximum
//! number of concurrently in-flight tasks, and at most one in-flight task
//! per named group. Waiting is represented entirely by tasks sitting in a
//! queue; nothing blocks, and a single driver task owns all state.
//!
//! # Example
//!
//! ```ignore
//! use taskthrottle::{Throttle, ThrottleConfig};
//!
//! let throttle = Throttle::spawn(ThrottleConfig {
//!     rate: 5,
//!     rate_per_ms: 1_000,
//!     concurrent: 2,
//!     ..Default::default()
//! });
//!
//! // Ergonomic path: a future runs once admitted, completion is automatic
//! throttle.run(Some("api.example.com".into()), async {
//!     // outbound call here
//! });
//!
//! // Primitive path: adapter code dispatches and reports back itself
//! let ticket = throttle.submit(|ticket| {
//!     // start the work, keep the ticket
//! });
//! // ... once the work finishes:
//! throttle.complete(ticket);
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration types and runtime updates
//! - [`events`] - Sent/Received/Drained broadcast events
//! - [`scheduler`] - Driver, queue, window, and the [`Throttle`] handle

pub mod config;
pub mod events;
pub mod scheduler;

pub use config::{ConfigUpdate, ThrottleConfig};
pub use events::{EventBus, ThrottleEvent};
pub use scheduler::{TaskTicket, Throttle, ThrottleError, ThrottleState, ThrottleStats};
