//! Shared workflow memory: todos, per-todo history, rolling summaries.
//!
//! `PlannerMemory` is single-writer: only the workflow driver mutates it,
//! between todo runs, through the small set of methods below. Everything
//! else reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AgentError;
use lux_protocol::{Action, ActionType};

/// Lifecycle of one todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl TodoStatus {
    /// Terminal states never run again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TodoStatus::Completed | TodoStatus::Skipped)
    }

    /// Open states are candidates for selection.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

/// One unit of work inside a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub description: String,
    pub status: TodoStatus,
}

impl Todo {
    fn pending(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: TodoStatus::Pending,
        }
    }
}

/// Discriminates entries in a todo's action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ActionRecordKind {
    Act(ActionType),
    Plan,
    Reflect,
    Summary,
    Error,
}

impl ActionRecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionRecordKind::Act(action_type) => action_type.as_str(),
            ActionRecordKind::Plan => "plan",
            ActionRecordKind::Reflect => "reflect",
            ActionRecordKind::Summary => "summary",
            ActionRecordKind::Error => "error",
        }
    }
}

impl From<ActionRecordKind> for String {
    fn from(kind: ActionRecordKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One entry in the log a workflow keeps per todo.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub at: DateTime<Utc>,
    pub kind: ActionRecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_uuid: Option<String>,
}

impl ActionRecord {
    pub fn new(kind: ActionRecordKind) -> Self {
        Self {
            at: Utc::now(),
            kind,
            target: None,
            reasoning: None,
            result: None,
            screenshot_uuid: None,
        }
    }

    pub fn from_action(
        action: &Action,
        reasoning: Option<&str>,
        screenshot_uuid: Option<&str>,
    ) -> Self {
        Self::new(ActionRecordKind::Act(action.action_type))
            .with_target(action.argument.clone())
            .with_reasoning_opt(reasoning)
            .with_screenshot_opt(screenshot_uuid)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_screenshot_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.screenshot_uuid = Some(uuid.into());
        self
    }

    fn with_reasoning_opt(mut self, reasoning: Option<&str>) -> Self {
        self.reasoning = reasoning.map(str::to_string);
        self
    }

    fn with_screenshot_opt(mut self, uuid: Option<&str>) -> Self {
        self.screenshot_uuid = uuid.map(str::to_string);
        self
    }
}

/// Immutable record of one completed todo run.
#[derive(Debug, Clone, Serialize)]
pub struct TodoHistory {
    pub todo_index: usize,
    pub description: String,
    pub actions: Vec<ActionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub completed: bool,
}

/// Workflow-level memory shared between the driver and the planner.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PlannerMemory {
    task_description: String,
    todos: Vec<Todo>,
    history: Vec<TodoHistory>,
    task_execution_summary: String,
    todo_execution_summaries: BTreeMap<usize, String>,
}

impl PlannerMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the memory for a new task with its initial todo list.
    ///
    /// Duplicate and empty descriptions are dropped.
    pub fn set_task<I, S>(&mut self, description: impl Into<String>, todos: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task_description = description.into();
        self.todos.clear();
        self.history.clear();
        self.task_execution_summary.clear();
        self.todo_execution_summaries.clear();
        for todo in todos {
            self.append_todo(todo);
        }
    }

    /// Append a todo unless an identical description already exists.
    pub fn append_todo(&mut self, description: impl Into<String>) -> bool {
        let description = description.into();
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return false;
        }
        if self.todos.iter().any(|t| t.description == trimmed) {
            return false;
        }
        self.todos.push(Todo::pending(trimmed));
        true
    }

    /// Change one todo's status, optionally recording its run summary.
    ///
    /// At most one todo may be in progress at a time; violations and
    /// out-of-range indices are state errors.
    pub fn update_todo(
        &mut self,
        index: usize,
        status: TodoStatus,
        summary: Option<String>,
    ) -> Result<(), AgentError> {
        if index >= self.todos.len() {
            return Err(AgentError::state(format!(
                "todo index {index} out of range ({} todos)",
                self.todos.len()
            )));
        }
        if status == TodoStatus::InProgress {
            let other_running = self
                .todos
                .iter()
                .enumerate()
                .any(|(i, t)| i != index && t.status == TodoStatus::InProgress);
            if other_running {
                return Err(AgentError::state("another todo is already in progress"));
            }
        }
        self.todos[index].status = status;
        if let Some(summary) = summary {
            self.todo_execution_summaries.insert(index, summary);
        }
        Ok(())
    }

    /// Record the outcome of one todo run, append-only.
    pub fn add_history(&mut self, entry: TodoHistory) -> Result<(), AgentError> {
        if entry.todo_index >= self.todos.len() {
            return Err(AgentError::state(format!(
                "history references todo index {} out of range",
                entry.todo_index
            )));
        }
        self.history.push(entry);
        Ok(())
    }

    /// First open todo in insertion order, if any.
    pub fn get_current_todo(&self) -> Option<(usize, &Todo)> {
        self.todos
            .iter()
            .enumerate()
            .find(|(_, todo)| todo.status.is_open())
    }

    /// Rebuild the rolling task summary from the three most recent
    /// completed history entries that carry a summary.
    pub fn refresh_overall_summary(&mut self) {
        let mut recent: Vec<&TodoHistory> = self
            .history
            .iter()
            .rev()
            .filter(|h| h.completed && h.summary.is_some())
            .take(3)
            .collect();
        recent.reverse();
        self.task_execution_summary = recent
            .iter()
            .filter_map(|h| {
                h.summary
                    .as_deref()
                    .map(|s| format!("- {}: {}", h.description, s))
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    pub fn task_description(&self) -> &str {
        &self.task_description
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn history(&self) -> &[TodoHistory] {
        &self.history
    }

    pub fn overall_summary(&self) -> &str {
        &self.task_execution_summary
    }

    pub fn todo_summaries(&self) -> &BTreeMap<usize, String> {
        &self.todo_execution_summaries
    }
}
