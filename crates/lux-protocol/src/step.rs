//! One parsed model reply: reasoning, actions, and termination flag.

use crate::action::{Action, ActionType};
use serde::{Deserialize, Serialize};

/// Token accounting reported by the backend for a single step call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single decision from the model.
///
/// `stop` is derived from the action list at construction time and cannot be
/// set independently: a step stops the task iff it contains a `finish`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub actions: Vec<Action>,
    pub stop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Step {
    pub fn new(reason: Option<String>, actions: Vec<Action>) -> Self {
        let stop = actions
            .iter()
            .any(|action| action.action_type == ActionType::Finish);
        Self {
            reason,
            actions,
            stop,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    /// True when the step carries no executable actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_derived_from_finish_presence() {
        let step = Step::new(None, vec![Action::click(10, 20)]);
        assert!(!step.stop);

        let step = Step::new(None, vec![Action::click(10, 20), Action::finish()]);
        assert!(step.stop);

        let step = Step::new(Some("done".into()), vec![]);
        assert!(!step.stop);
    }

    #[test]
    fn usage_survives_attachment() {
        let usage = TokenUsage {
            prompt_tokens: 11,
            completion_tokens: 5,
            total_tokens: 16,
        };
        let step = Step::new(None, vec![Action::finish()]).with_usage(Some(usage));
        assert_eq!(step.usage, Some(usage));
        assert!(step.stop);
    }

    #[test]
    fn reason_omitted_from_json_when_absent() {
        let step = Step::new(None, vec![Action::finish()]);
        let json = serde_json::to_string(&step).expect("serialize");
        assert!(!json.contains("reason"));
        assert!(json.contains("\"stop\":true"));
    }
}
