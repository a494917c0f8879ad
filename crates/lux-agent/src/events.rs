//! Ordered progress events emitted by running agents.
//!
//! Observers are passive: the runtime never reads anything back from them
//! and never routes control flow through them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

use lux_protocol::{Action, Step};

/// Marks the boundary of one todo's execution inside a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPhase {
    Begin,
    End,
}

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// What happened.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// One model decision landed.
    Step {
        step: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        stop: bool,
    },
    /// One action is about to be replayed.
    Action { action: Action },
    /// A plan or pivot instruction was adopted.
    Plan { instruction: String, reasoning: String },
    /// A todo's execution began or ended.
    Split {
        todo_index: usize,
        description: String,
        phase: SplitPhase,
    },
    /// Free-form progress note.
    Log { level: EventLevel, message: String },
}

/// A timestamped progress event.
#[derive(Debug, Clone, Serialize)]
pub struct AgentEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl AgentEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            at: Utc::now(),
            kind,
        }
    }

    pub fn step(step_number: u32, step: &Step) -> Self {
        Self::new(EventKind::Step {
            step: step_number,
            reason: step.reason.clone(),
            stop: step.stop,
        })
    }

    pub fn action(action: &Action) -> Self {
        Self::new(EventKind::Action {
            action: action.clone(),
        })
    }

    pub fn plan(instruction: &str, reasoning: &str) -> Self {
        Self::new(EventKind::Plan {
            instruction: instruction.to_string(),
            reasoning: reasoning.to_string(),
        })
    }

    pub fn split(todo_index: usize, description: &str, phase: SplitPhase) -> Self {
        Self::new(EventKind::Split {
            todo_index,
            description: description.to_string(),
            phase,
        })
    }

    pub fn log(level: EventLevel, message: impl Into<String>) -> Self {
        Self::new(EventKind::Log {
            level,
            message: message.into(),
        })
    }
}

/// Receives the ordered event stream of a run.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &AgentEvent);
}

/// Observer that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_event(&self, _event: &AgentEvent) {}
}

/// Observer that keeps every event in memory, in arrival order.
///
/// Snapshots feed the export renderers and the assertions in tests.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<AgentEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<AgentEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("events lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Observer for MemoryObserver {
    fn on_event(&self, event: &AgentEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_protocol::ActionType;

    #[test]
    fn memory_observer_preserves_order() {
        let observer = MemoryObserver::new();
        observer.on_event(&AgentEvent::split(0, "open the editor", SplitPhase::Begin));
        observer.on_event(&AgentEvent::action(&Action::click(5, 9)));
        observer.on_event(&AgentEvent::split(0, "open the editor", SplitPhase::End));

        let events = observer.snapshot();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0].kind,
            EventKind::Split {
                phase: SplitPhase::Begin,
                ..
            }
        ));
        assert!(matches!(
            events[1].kind,
            EventKind::Action { ref action } if action.action_type == ActionType::Click
        ));
        assert!(matches!(
            events[2].kind,
            EventKind::Split {
                phase: SplitPhase::End,
                ..
            }
        ));
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = AgentEvent::log(EventLevel::Warn, "budget low");
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"log\""));
        assert!(json.contains("\"level\":\"warn\""));
    }
}
