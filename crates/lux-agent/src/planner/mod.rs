//! Worker-backed planning: initial plans, reflection, summarization.

mod context;
pub mod output;

pub use output::{PlannerOutput, ReflectionOutput};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::backend::ModelBackend;
use crate::errors::AgentError;
use crate::memory::{ActionRecord, PlannerMemory};
use crate::screenshot::ResolvedScreenshot;

/// Ad-hoc context entries merged into worker payloads.
pub type ContextMap = serde_json::Map<String, Value>;

/// Identifiers of the hosted workers backing each planning operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIds {
    pub initial_plan: String,
    pub reflection: String,
    pub summarization: String,
}

impl Default for WorkerIds {
    fn default() -> Self {
        Self {
            initial_plan: "initial_plan".to_string(),
            reflection: "reflection".to_string(),
            summarization: "summarization".to_string(),
        }
    }
}

impl WorkerIds {
    fn validate(&self) -> Result<(), AgentError> {
        for (name, id) in [
            ("initial_plan", &self.initial_plan),
            ("reflection", &self.reflection),
            ("summarization", &self.summarization),
        ] {
            if id.trim().is_empty() {
                return Err(AgentError::config(format!(
                    "worker id for {name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Front-end to the three planning workers.
///
/// Worker replies are free text; parsing is tolerant with per-operation
/// fallbacks, so planner calls only fail on backend errors.
#[derive(Clone)]
pub struct Planner {
    backend: Arc<dyn ModelBackend>,
    workers: WorkerIds,
}

impl Planner {
    /// Build a planner, rejecting empty worker identifiers up front.
    pub fn new(backend: Arc<dyn ModelBackend>, workers: WorkerIds) -> Result<Self, AgentError> {
        workers.validate()?;
        Ok(Self { backend, workers })
    }

    pub fn workers(&self) -> &WorkerIds {
        &self.workers
    }

    /// Ask the planning worker for an instruction and subtodos for `todo`.
    pub async fn initial_plan(
        &self,
        todo: &str,
        extra: &ContextMap,
        screenshot: Option<&ResolvedScreenshot>,
        memory: Option<&PlannerMemory>,
        todo_index: Option<usize>,
    ) -> Result<(PlannerOutput, String), AgentError> {
        let payload = context::plan_payload(
            todo,
            context::build_context(memory, todo_index, extra),
            screenshot,
        );
        let reply = self
            .backend
            .call_worker(&self.workers.initial_plan, payload)
            .await?;
        let plan = output::parse_plan(&reply.text);
        info!(
            worker = %self.workers.initial_plan,
            request_id = %reply.request_id,
            subtodos = plan.subtodos.len(),
            "initial plan received"
        );
        Ok((plan, reply.request_id))
    }

    /// Ask the reflection worker whether to continue, pivot, or stop.
    ///
    /// Only the last `reflection_interval` records are sent.
    #[allow(clippy::too_many_arguments)]
    pub async fn reflect(
        &self,
        actions: &[ActionRecord],
        extra: &ContextMap,
        screenshot: Option<&ResolvedScreenshot>,
        memory: Option<&PlannerMemory>,
        todo_index: Option<usize>,
        current_instruction: &str,
        reflection_interval: u32,
    ) -> Result<(ReflectionOutput, String), AgentError> {
        let window_start = actions.len().saturating_sub(reflection_interval as usize);
        let payload = context::reflect_payload(
            current_instruction,
            &actions[window_start..],
            context::build_context(memory, todo_index, extra),
            screenshot,
        );
        let reply = self
            .backend
            .call_worker(&self.workers.reflection, payload)
            .await?;
        let reflection = output::parse_reflection(&reply.text);
        info!(
            worker = %self.workers.reflection,
            request_id = %reply.request_id,
            success = reflection.success_assessment,
            pivot = reflection.new_instruction.is_some(),
            "reflection received"
        );
        Ok((reflection, reply.request_id))
    }

    /// Ask the summarization worker for a run summary over the full log.
    pub async fn summarize(
        &self,
        actions: &[ActionRecord],
        extra: &ContextMap,
        memory: Option<&PlannerMemory>,
        todo_index: Option<usize>,
    ) -> Result<(String, String), AgentError> {
        let payload = context::summary_payload(
            actions,
            context::build_context(memory, todo_index, extra),
        );
        let reply = self
            .backend
            .call_worker(&self.workers.summarization, payload)
            .await?;
        let summary = output::parse_summary(&reply.text);
        info!(
            worker = %self.workers.summarization,
            request_id = %reply.request_id,
            "summary received"
        );
        Ok((summary, reply.request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::memory::ActionRecordKind;

    #[test]
    fn empty_worker_ids_are_rejected() {
        let backend = Arc::new(ScriptedBackend::new());
        let workers = WorkerIds {
            reflection: "  ".to_string(),
            ..WorkerIds::default()
        };
        let err = Planner::new(backend, workers).expect_err("must fail");
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[tokio::test]
    async fn reflection_windows_the_action_log() {
        let backend = Arc::new(ScriptedBackend::new());
        let planner = Planner::new(backend.clone(), WorkerIds::default()).expect("planner");
        let log: Vec<ActionRecord> = (0..7)
            .map(|i| ActionRecord::new(ActionRecordKind::Plan).with_result(format!("r{i}")))
            .collect();

        planner
            .reflect(&log, &ContextMap::new(), None, None, None, "keep going", 3)
            .await
            .expect("reflect");

        let calls = backend.worker_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "reflection");
        let sent = calls[0].1["actions"].as_array().expect("actions array");
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["result"], "r4");
        assert_eq!(sent[2]["result"], "r6");
    }

    #[tokio::test]
    async fn plan_call_reaches_the_configured_worker() {
        let backend = Arc::new(ScriptedBackend::new().with_worker_reply(
            r#"{"instruction": "open inbox", "reasoning": "start there", "subtodos": []}"#,
        ));
        let workers = WorkerIds {
            initial_plan: "plan-v2".to_string(),
            ..WorkerIds::default()
        };
        let planner = Planner::new(backend.clone(), workers).expect("planner");

        let (plan, request_id) = planner
            .initial_plan("read mail", &ContextMap::new(), None, None, None)
            .await
            .expect("plan");

        assert_eq!(plan.instruction, "open inbox");
        assert!(!request_id.is_empty());
        assert_eq!(backend.worker_calls()[0].0, "plan-v2");
    }
}
