//! Event system for observing throttle activity
//!
//! Every dispatch and completion emits an event. Consumers subscribe to the
//! bus and replay the lifecycle: `Sent` when a task is admitted, `Received`
//! when it completes, `Drained` when the throttle goes fully idle.
//!
//! # Usage
//!
//! ```rust,ignore
//! use taskthrottle::events::ThrottleEvent;
//!
//! let mut rx = throttle.subscribe();
//! while let Ok(event) = rx.recv().await {
//!     println!("Event: {:?}", event);
//! }
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use types::ThrottleEvent;
