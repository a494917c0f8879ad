//! Executes one todo end to end: plan, act, reflect, summarize.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::actor::Actor;
use crate::backend::ModelBackend;
use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::events::{AgentEvent, EventLevel, Observer};
use crate::executor::ActionExecutor;
use crate::memory::{ActionRecord, ActionRecordKind, PlannerMemory};
use crate::planner::{ContextMap, Planner};
use crate::screenshot::{resolve_screenshot, ScreenshotProvider};

/// Everything a finished todo run reports back to the workflow driver.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub actions: Vec<ActionRecord>,
    pub summary: String,
    pub total_steps: u32,
    pub subtodos: Vec<String>,
}

/// State machine driving a single todo.
///
/// Phases: planning, then executing with periodic reflection, then exactly
/// one summarization per completed run. The taskee never mutates the shared
/// memory it reads; its results are folded in by the workflow driver.
pub struct Taskee {
    backend: Arc<dyn ModelBackend>,
    planner: Planner,
    config: AgentConfig,
    observer: Arc<dyn Observer>,
    cancel: CancellationToken,
    log: Vec<ActionRecord>,
    subtodos: Vec<String>,
    summary: String,
    total_steps: u32,
    success: bool,
}

impl Taskee {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        planner: Planner,
        config: AgentConfig,
        observer: Arc<dyn Observer>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            planner,
            config,
            observer,
            cancel,
            log: Vec::new(),
            subtodos: Vec::new(),
            summary: String::new(),
            total_steps: 0,
            success: false,
        }
    }

    /// Run the todo at `todo_index` to completion.
    ///
    /// Executor failures and cancellation propagate; every other error is
    /// recorded in the action log and converts the run into `Ok(false)`.
    /// Budget exhaustion is an ordinary unsuccessful outcome, not an error.
    pub async fn run(
        &mut self,
        memory: &PlannerMemory,
        todo_index: usize,
        executor: Arc<dyn ActionExecutor>,
        screenshots: Arc<dyn ScreenshotProvider>,
    ) -> Result<bool, AgentError> {
        let todo = memory
            .todos()
            .get(todo_index)
            .ok_or_else(|| AgentError::state(format!("todo index {todo_index} out of range")))?
            .description
            .clone();

        self.log.clear();
        self.subtodos.clear();
        self.summary.clear();
        self.total_steps = 0;
        self.success = false;
        executor.reset().await?;

        let outcome = self
            .drive(&todo, memory, todo_index, &executor, &screenshots)
            .await;
        match outcome {
            Ok(success) => {
                self.success = success;
                self.summarize(memory, todo_index).await;
                Ok(success)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(todo = %todo, error = %err, "todo run failed");
                self.observer.on_event(&AgentEvent::log(
                    EventLevel::Error,
                    format!("todo failed: {err}"),
                ));
                self.log
                    .push(ActionRecord::new(ActionRecordKind::Error).with_result(err.to_string()));
                self.success = false;
                self.summarize(memory, todo_index).await;
                Ok(false)
            }
        }
    }

    /// Snapshot of the last run, for folding into workflow memory.
    pub fn execution_results(&self) -> ExecutionResult {
        ExecutionResult {
            success: self.success,
            actions: self.log.clone(),
            summary: self.summary.clone(),
            total_steps: self.total_steps,
            subtodos: self.subtodos.clone(),
        }
    }

    async fn drive(
        &mut self,
        todo: &str,
        memory: &PlannerMemory,
        todo_index: usize,
        executor: &Arc<dyn ActionExecutor>,
        screenshots: &Arc<dyn ScreenshotProvider>,
    ) -> Result<bool, AgentError> {
        // Planning
        let shot = screenshots.capture().await?;
        let resolved = resolve_screenshot(self.backend.as_ref(), shot).await?;
        let (plan, _request_id) = self
            .planner
            .initial_plan(
                todo,
                &ContextMap::new(),
                Some(&resolved),
                Some(memory),
                Some(todo_index),
            )
            .await?;
        self.subtodos = plan.subtodos;

        let mut record = ActionRecord::new(ActionRecordKind::Plan)
            .with_target(todo)
            .with_reasoning(plan.reasoning.clone())
            .with_result(plan.instruction.clone());
        if let Some(uuid) = &resolved.uuid {
            record = record.with_screenshot_uuid(uuid.clone());
        }
        self.log.push(record);

        let mut instruction = if plan.instruction.is_empty() {
            todo.to_string()
        } else {
            plan.instruction
        };
        self.observer
            .on_event(&AgentEvent::plan(&instruction, &plan.reasoning));
        info!(todo = %todo, instruction = %instruction, "todo planning complete");

        let mut actor = Actor::new(self.backend.clone(), self.config.model.clone())
            .with_temperature(self.config.temperature);
        actor.init_task(instruction.clone(), self.config.max_steps);
        let mut last_screenshot = resolved;

        loop {
            // Executing
            let mut actions_since_reflection: u32 = 0;
            let mut stopped = false;
            while actor.remaining_steps() > 0 {
                if self.cancel.is_cancelled() {
                    return Err(AgentError::Interrupted);
                }
                let shot = screenshots.capture().await?;
                let resolved = resolve_screenshot(self.backend.as_ref(), shot).await?;
                let step = actor.step(&resolved.url, None, None).await?;
                self.total_steps += 1;
                self.observer
                    .on_event(&AgentEvent::step(self.total_steps, &step));
                for action in &step.actions {
                    self.log.push(ActionRecord::from_action(
                        action,
                        step.reason.as_deref(),
                        resolved.uuid.as_deref(),
                    ));
                    self.observer.on_event(&AgentEvent::action(action));
                }
                actions_since_reflection += step.actions.len() as u32;
                executor.execute(&step.actions).await?;
                last_screenshot = resolved;

                if step.stop {
                    executor.reset().await?;
                    stopped = true;
                    break;
                }
                if self.config.step_delay_ms > 0 {
                    sleep(Duration::from_millis(self.config.step_delay_ms)).await;
                }
                if actions_since_reflection >= self.config.reflection_interval {
                    break;
                }
            }

            if stopped {
                info!(todo = %todo, steps = self.total_steps, "model signalled completion");
                return Ok(true);
            }
            if actor.remaining_steps() == 0 {
                warn!(todo = %todo, steps = self.total_steps, "step budget exhausted");
                return Ok(false);
            }

            // Reflecting
            let (reflection, _request_id) = self
                .planner
                .reflect(
                    &self.log,
                    &ContextMap::new(),
                    Some(&last_screenshot),
                    Some(memory),
                    Some(todo_index),
                    &instruction,
                    self.config.reflection_interval,
                )
                .await?;
            self.log.push(
                ActionRecord::new(ActionRecordKind::Reflect).with_result(format!(
                    "success={}, pivot={}",
                    reflection.success_assessment,
                    reflection.new_instruction.is_some()
                )),
            );
            if reflection.success_assessment {
                info!(todo = %todo, "reflection judged todo complete");
                return Ok(true);
            }
            if let Some(new_instruction) = reflection.new_instruction {
                let remaining = actor.remaining_steps();
                instruction = new_instruction;
                actor.init_task(instruction.clone(), remaining);
                self.observer
                    .on_event(&AgentEvent::plan(&instruction, "reflection pivot"));
                info!(todo = %todo, instruction = %instruction, remaining, "pivoting to new instruction");
            }
        }
    }

    /// Summarization runs once per completed run, even after recorded
    /// failures; its own failure is logged rather than propagated.
    async fn summarize(&mut self, memory: &PlannerMemory, todo_index: usize) {
        let result = self
            .planner
            .summarize(&self.log, &ContextMap::new(), Some(memory), Some(todo_index))
            .await;
        match result {
            Ok((summary, _request_id)) => {
                self.summary = summary.clone();
                self.log
                    .push(ActionRecord::new(ActionRecordKind::Summary).with_result(summary));
            }
            Err(err) => {
                warn!(error = %err, "summarization failed");
                self.log.push(
                    ActionRecord::new(ActionRecordKind::Error)
                        .with_result(format!("summarization failed: {err}")),
                );
            }
        }
    }
}
