//! Low-level conversation driver for a single task.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::{ChatTurn, ModelBackend, StepRequest};
use crate::config::model_step_ceiling;
use crate::errors::AgentError;
use lux_protocol::{parse_step, Step};

struct TaskState {
    id: String,
    description: String,
    history: Vec<ChatTurn>,
    steps_taken: u32,
    max_steps: u32,
}

/// Owns one conversation with the model and meters its step budget.
///
/// An actor is single-task: `init_task` starts a fresh conversation and
/// every `step` call consumes one unit of budget. The budget is clamped to
/// the per-model ceiling, never raised.
pub struct Actor {
    backend: Arc<dyn ModelBackend>,
    model: String,
    temperature: Option<f32>,
    task: Option<TaskState>,
}

impl Actor {
    pub fn new(backend: Arc<dyn ModelBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            temperature: None,
            task: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Begin a new task, discarding any previous conversation.
    pub fn init_task(&mut self, description: impl Into<String>, max_steps: u32) {
        let description = description.into();
        let ceiling = model_step_ceiling(&self.model);
        let budget = if max_steps > ceiling {
            warn!(
                model = %self.model,
                requested = max_steps,
                ceiling,
                "requested step budget exceeds model ceiling, clamping"
            );
            ceiling
        } else {
            max_steps
        };
        let id = Uuid::new_v4().to_string();
        debug!(task = %id, budget, "actor task initialized");
        self.task = Some(TaskState {
            id,
            description,
            history: Vec::new(),
            steps_taken: 0,
            max_steps: budget,
        });
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task.as_ref().map(|t| t.id.as_str())
    }

    pub fn steps_taken(&self) -> u32 {
        self.task.as_ref().map_or(0, |t| t.steps_taken)
    }

    pub fn remaining_steps(&self) -> u32 {
        self.task
            .as_ref()
            .map_or(0, |t| t.max_steps.saturating_sub(t.steps_taken))
    }

    /// Run one step of the conversation against the given screenshot.
    ///
    /// The task prompt is sent on the first turn only; `instruction`
    /// overrides the stored description for that turn. Each call consumes
    /// one unit of budget, including calls that fail at the backend.
    pub async fn step(
        &mut self,
        screenshot_url: &str,
        instruction: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<Step, AgentError> {
        let state = self
            .task
            .as_mut()
            .ok_or_else(|| AgentError::state("actor has no initialized task"))?;
        if state.steps_taken >= state.max_steps {
            return Err(AgentError::state(format!(
                "step budget exhausted after {} steps",
                state.max_steps
            )));
        }
        state.steps_taken += 1;

        let mut turn = ChatTurn::user(screenshot_url);
        if state.history.is_empty() {
            let prompt = instruction.unwrap_or(&state.description);
            turn = turn.with_text(prompt);
        }

        let mut messages = state.history.clone();
        messages.push(turn.clone());
        let request = StepRequest {
            model: self.model.clone(),
            task_id: state.id.clone(),
            messages,
            temperature: temperature.or(self.temperature),
        };

        let reply = self.backend.chat_step(request).await?;
        state.history.push(turn);
        state.history.push(ChatTurn::assistant(reply.text.clone()));

        let step = parse_step(&reply.text).with_usage(reply.usage);
        debug!(
            task = %state.id,
            step = state.steps_taken,
            actions = step.actions.len(),
            stop = step.stop,
            "actor step complete"
        );
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;

    fn actor_with(backend: Arc<ScriptedBackend>) -> Actor {
        Actor::new(backend, "lux-1")
    }

    #[tokio::test]
    async fn step_without_task_is_a_state_error() {
        let mut actor = actor_with(Arc::new(ScriptedBackend::new()));
        let err = actor
            .step("https://images.lux.dev/a.png", None, None)
            .await
            .expect_err("must fail");
        assert!(matches!(err, AgentError::State(_)));
    }

    #[tokio::test]
    async fn first_turn_carries_the_prompt_and_later_turns_do_not() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_step("<action>click(1, 2)</action>")
                .with_step("<action>finish()</action>"),
        );
        let mut actor = actor_with(backend.clone());
        actor.init_task("open the settings panel", 10);

        actor
            .step("https://images.lux.dev/a.png", None, None)
            .await
            .expect("step one");
        actor
            .step("https://images.lux.dev/b.png", None, None)
            .await
            .expect("step two");

        let requests = backend.step_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].messages[0].text.as_deref(),
            Some("open the settings panel")
        );
        // Second request replays history plus a text-free user turn.
        assert_eq!(requests[1].messages.len(), 3);
        assert!(requests[1].messages[2].text.is_none());
    }

    #[tokio::test]
    async fn budget_ceiling_is_clamped_per_model() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut actor = Actor::new(backend, "lux-1-lite");
        actor.init_task("anything", 500);
        assert_eq!(actor.remaining_steps(), 40);
    }

    #[tokio::test]
    async fn exhausted_budget_fails_with_state_error() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_step("<action>wait()</action>")
                .with_step("<action>wait()</action>"),
        );
        let mut actor = actor_with(backend);
        actor.init_task("poke around", 2);

        for _ in 0..2 {
            actor
                .step("https://images.lux.dev/a.png", None, None)
                .await
                .expect("budgeted step");
        }
        let err = actor
            .step("https://images.lux.dev/a.png", None, None)
            .await
            .expect_err("over budget");
        assert!(matches!(err, AgentError::State(_)));
        assert_eq!(actor.steps_taken(), 2);
    }

    #[tokio::test]
    async fn usage_is_attached_from_the_reply() {
        let backend = Arc::new(ScriptedBackend::new().with_step("<action>finish()</action>"));
        let mut actor = actor_with(backend);
        actor.init_task("stop immediately", 5);
        let step = actor
            .step("https://images.lux.dev/a.png", None, None)
            .await
            .expect("step");
        assert!(step.stop);
        assert!(step.usage.is_some());
    }
}
