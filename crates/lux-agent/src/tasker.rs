//! Workflow driver: decomposes a task into todos and runs them in order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::agent::Agent;
use crate::backend::ModelBackend;
use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::events::{AgentEvent, EventLevel, NullObserver, Observer, SplitPhase};
use crate::executor::ActionExecutor;
use crate::memory::{PlannerMemory, TodoHistory, TodoStatus};
use crate::planner::{ContextMap, Planner, WorkerIds};
use crate::screenshot::{resolve_screenshot, ScreenshotProvider};
use crate::taskee::Taskee;

/// Hierarchical agent: plans a todo list, then drives one taskee per todo.
///
/// The tasker is the only writer of the shared [`PlannerMemory`]; results
/// are folded in between todo runs. A todo whose run fails without a fatal
/// error stays in progress and is retried with fresh planning until its
/// attempt budget runs out, after which it is skipped.
pub struct Tasker {
    backend: Arc<dyn ModelBackend>,
    planner: Planner,
    config: AgentConfig,
    observer: Arc<dyn Observer>,
    cancel: CancellationToken,
    memory: PlannerMemory,
    attempts: HashMap<usize, u32>,
}

impl Tasker {
    pub fn new(backend: Arc<dyn ModelBackend>, config: AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;
        let planner = Planner::new(backend.clone(), WorkerIds::default())?;
        Ok(Self {
            backend,
            planner,
            config,
            observer: Arc::new(NullObserver),
            cancel: CancellationToken::new(),
            memory: PlannerMemory::new(),
            attempts: HashMap::new(),
        })
    }

    /// Replace the default worker identifiers.
    pub fn with_workers(mut self, workers: WorkerIds) -> Result<Self, AgentError> {
        self.planner = Planner::new(self.backend.clone(), workers)?;
        Ok(self)
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Read access to the workflow memory, mainly for inspection after runs.
    pub fn memory(&self) -> &PlannerMemory {
        &self.memory
    }

    /// Select the next todo to run: first open todo in order, marked in
    /// progress. Todos whose attempt budget is spent are skipped here.
    fn prepare(&mut self) -> Result<Option<usize>, AgentError> {
        loop {
            let Some((index, todo)) = self.memory.get_current_todo() else {
                return Ok(None);
            };
            let status = todo.status;
            let description = todo.description.clone();

            let tries = self.attempts.get(&index).copied().unwrap_or(0);
            if tries >= self.config.max_todo_attempts {
                warn!(todo = %description, tries, "todo attempts exhausted, skipping");
                self.observer.on_event(&AgentEvent::log(
                    EventLevel::Warn,
                    format!("skipping todo {index} after {tries} attempts: {description}"),
                ));
                self.memory.update_todo(index, TodoStatus::Skipped, None)?;
                continue;
            }
            self.attempts.insert(index, tries + 1);

            if status == TodoStatus::Pending {
                self.memory.update_todo(index, TodoStatus::InProgress, None)?;
            }
            return Ok(Some(index));
        }
    }
}

#[async_trait]
impl Agent for Tasker {
    async fn execute(
        &mut self,
        instruction: &str,
        executor: Arc<dyn ActionExecutor>,
        screenshots: Arc<dyn ScreenshotProvider>,
    ) -> Result<bool, AgentError> {
        self.attempts.clear();

        // Seed the todo list from an initial plan over the first screenshot.
        let shot = screenshots.capture().await?;
        let resolved = resolve_screenshot(self.backend.as_ref(), shot).await?;
        let (plan, _request_id) = self
            .planner
            .initial_plan(instruction, &ContextMap::new(), Some(&resolved), None, None)
            .await?;
        self.observer
            .on_event(&AgentEvent::plan(&plan.instruction, &plan.reasoning));
        self.memory.set_task(instruction, plan.subtodos);
        if self.memory.get_current_todo().is_none() {
            // No decomposition came back: run the instruction as one todo.
            self.memory.append_todo(instruction);
        }
        info!(
            todos = self.memory.todos().len(),
            "workflow seeded from initial plan"
        );

        while let Some(index) = self.prepare()? {
            if self.cancel.is_cancelled() {
                return Err(AgentError::Interrupted);
            }
            let description = self.memory.todos()[index].description.clone();
            self.observer
                .on_event(&AgentEvent::split(index, &description, SplitPhase::Begin));

            let mut taskee = Taskee::new(
                self.backend.clone(),
                self.planner.clone(),
                self.config.clone(),
                self.observer.clone(),
                self.cancel.clone(),
            );
            let run = taskee
                .run(&self.memory, index, executor.clone(), screenshots.clone())
                .await;
            let result = taskee.execution_results();

            match run {
                Ok(success) => {
                    let status = if success {
                        TodoStatus::Completed
                    } else {
                        TodoStatus::InProgress
                    };
                    let summary = (!result.summary.is_empty()).then(|| result.summary.clone());
                    self.memory.update_todo(index, status, summary.clone())?;
                    self.memory.add_history(TodoHistory {
                        todo_index: index,
                        description: description.clone(),
                        actions: result.actions,
                        summary,
                        completed: success,
                    })?;
                    for subtodo in result.subtodos {
                        self.memory.append_todo(subtodo);
                    }
                    self.memory.refresh_overall_summary();
                    self.observer
                        .on_event(&AgentEvent::split(index, &description, SplitPhase::End));
                    info!(todo = %description, success, steps = result.total_steps, "todo folded");
                }
                Err(AgentError::Interrupted) => return Err(AgentError::Interrupted),
                Err(err) => {
                    self.observer.on_event(&AgentEvent::log(
                        EventLevel::Error,
                        format!("todo {index} failed: {err}"),
                    ));
                    self.observer
                        .on_event(&AgentEvent::split(index, &description, SplitPhase::End));
                    if self.memory.todos()[index].status == TodoStatus::InProgress {
                        error!(todo = %description, error = %err, "fatal failure, stopping workflow");
                        return Ok(false);
                    }
                    warn!(todo = %description, error = %err, "todo failed in terminal state, continuing");
                }
            }
        }

        let overall = self
            .memory
            .todos()
            .iter()
            .all(|todo| todo.status == TodoStatus::Completed);
        info!(
            overall,
            todos = self.memory.todos().len(),
            "workflow finished"
        );
        Ok(overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;

    fn tasker_with_todos(descriptions: &[&str], max_attempts: u32) -> Tasker {
        let backend = Arc::new(ScriptedBackend::new());
        let mut tasker = Tasker::new(
            backend,
            AgentConfig::minimal().with_max_todo_attempts(max_attempts),
        )
        .expect("tasker");
        tasker
            .memory
            .set_task("task", descriptions.iter().copied());
        tasker
    }

    #[test]
    fn prepare_marks_first_pending_in_progress() {
        let mut tasker = tasker_with_todos(&["a", "b"], 2);
        let index = tasker.prepare().expect("prepare").expect("candidate");
        assert_eq!(index, 0);
        assert_eq!(tasker.memory.todos()[0].status, TodoStatus::InProgress);
        assert_eq!(tasker.memory.todos()[1].status, TodoStatus::Pending);
    }

    #[test]
    fn prepare_skips_after_attempt_budget() {
        let mut tasker = tasker_with_todos(&["a", "b"], 1);
        // First attempt selects todo 0 and leaves it in progress.
        assert_eq!(tasker.prepare().expect("prepare"), Some(0));
        // Second call: todo 0 is out of attempts, gets skipped, todo 1 runs.
        assert_eq!(tasker.prepare().expect("prepare"), Some(1));
        assert_eq!(tasker.memory.todos()[0].status, TodoStatus::Skipped);
        assert_eq!(tasker.memory.todos()[1].status, TodoStatus::InProgress);
        // Third call: todo 1 is also out of attempts, nothing left to run.
        assert_eq!(tasker.prepare().expect("prepare"), None);
        assert_eq!(tasker.memory.todos()[1].status, TodoStatus::Skipped);
    }

    #[test]
    fn prepare_retries_within_attempt_budget() {
        let mut tasker = tasker_with_todos(&["a"], 2);
        assert_eq!(tasker.prepare().expect("prepare"), Some(0));
        // Still in progress, one attempt left: selected again.
        assert_eq!(tasker.prepare().expect("prepare"), Some(0));
        assert_eq!(tasker.prepare().expect("prepare"), None);
        assert_eq!(tasker.memory.todos()[0].status, TodoStatus::Skipped);
    }
}
