//! Event types for throttle activity streaming
//!
//! Three lifecycle events cover all observable throttle activity:
//! - Sent: a task was admitted and its action invoked
//! - Received: an in-flight task completed
//! - Drained: the last in-flight task completed with nothing queued

use serde::{Deserialize, Serialize};

use crate::scheduler::TaskTicket;

/// Core event enum - the vocabulary of throttle activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ThrottleEvent {
    /// A task has been dispatched
    Sent {
        ticket: TaskTicket,
        group: Option<String>,
    },
    /// A task has completed
    Received {
        ticket: TaskTicket,
        group: Option<String>,
    },
    /// Queue and in-flight set both emptied
    Drained,
}

impl ThrottleEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            ThrottleEvent::Sent { .. } => "Sent",
            ThrottleEvent::Received { .. } => "Received",
            ThrottleEvent::Drained => "Drained",
        }
    }

    /// Get the ticket this event concerns, if any
    pub fn ticket(&self) -> Option<TaskTicket> {
        match self {
            ThrottleEvent::Sent { ticket, .. } | ThrottleEvent::Received { ticket, .. } => Some(*ticket),
            ThrottleEvent::Drained => None,
        }
    }

    /// Get the group of the task this event concerns, if any
    pub fn group(&self) -> Option<&str> {
        match self {
            ThrottleEvent::Sent { group, .. } | ThrottleEvent::Received { group, .. } => group.as_deref(),
            ThrottleEvent::Drained => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = ThrottleEvent::Sent {
            ticket: TaskTicket::new(7),
            group: None,
        };
        assert_eq!(event.event_type(), "Sent");
        assert_eq!(ThrottleEvent::Drained.event_type(), "Drained");
    }

    #[test]
    fn test_event_accessors() {
        let event = ThrottleEvent::Received {
            ticket: TaskTicket::new(3),
            group: Some("backend".to_string()),
        };
        assert_eq!(event.ticket(), Some(TaskTicket::new(3)));
        assert_eq!(event.group(), Some("backend"));
        assert_eq!(ThrottleEvent::Drained.ticket(), None);
        assert_eq!(ThrottleEvent::Drained.group(), None);
    }

    #[test]
    fn test_event_serialization() {
        let event = ThrottleEvent::Sent {
            ticket: TaskTicket::new(42),
            group: Some("g".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Sent"));
        assert!(json.contains("42"));

        let parsed: ThrottleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type(), "Sent");
        assert_eq!(parsed.ticket(), Some(TaskTicket::new(42)));
        assert_eq!(parsed.group(), Some("g"));
    }
}
