//! Backend seam between the agent runtime and the hosted model API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::BackendError;
use lux_protocol::TokenUsage;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the per-task conversation kept by the actor.
///
/// User turns carry a hosted screenshot URL and, on the first turn only,
/// the task prompt. Assistant turns carry the raw model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ChatTurn {
    pub fn user(image_url: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: None,
            image_url: Some(image_url.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: Some(text.into()),
            image_url: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// One step-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct StepRequest {
    pub model: String,
    pub task_id: String,
    pub messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Raw model reply to a step-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Stable reference to an uploaded screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedImage {
    pub uuid: String,
    pub url: String,
}

/// Reply from a named planning worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReply {
    pub text: String,
    pub request_id: String,
}

/// Abstraction over the hosted model API so vendors and test doubles can
/// plug into the agent runtime.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run one chat-style step completion over the task conversation.
    async fn chat_step(&self, request: StepRequest) -> Result<StepReply, BackendError>;

    /// Upload screenshot bytes, returning a stable hosted reference.
    async fn upload_screenshot(&self, bytes: Vec<u8>) -> Result<HostedImage, BackendError>;

    /// Invoke a named planning worker with a structured payload.
    async fn call_worker(&self, worker: &str, payload: Value)
        -> Result<WorkerReply, BackendError>;
}

/// Deterministic backend used for tests and offline development.
///
/// Step and worker replies are served from queues; once a queue runs dry the
/// fallback step (a bare `finish()`) keeps flows terminating. Every request
/// is recorded for assertions.
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<String>>,
    worker_replies: Mutex<VecDeque<String>>,
    step_requests: Mutex<Vec<StepRequest>>,
    worker_calls: Mutex<Vec<(String, Value)>>,
    uploads: Mutex<Vec<usize>>,
    fallback_step: String,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            worker_replies: Mutex::new(VecDeque::new()),
            step_requests: Mutex::new(Vec::new()),
            worker_calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            fallback_step: "<think>nothing left to do</think>\n<action>finish()</action>"
                .to_string(),
        }
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a step reply during construction.
    pub fn with_step(self, text: impl Into<String>) -> Self {
        self.queue_step(text);
        self
    }

    /// Queue a worker reply during construction.
    pub fn with_worker_reply(self, text: impl Into<String>) -> Self {
        self.queue_worker_reply(text);
        self
    }

    pub fn queue_step(&self, text: impl Into<String>) {
        self.steps.lock().expect("steps lock").push_back(text.into());
    }

    pub fn queue_worker_reply(&self, text: impl Into<String>) {
        self.worker_replies
            .lock()
            .expect("worker lock")
            .push_back(text.into());
    }

    /// Step requests observed so far, in call order.
    pub fn step_requests(&self) -> Vec<StepRequest> {
        self.step_requests.lock().expect("requests lock").clone()
    }

    /// Worker calls observed so far as `(worker, payload)` pairs.
    pub fn worker_calls(&self) -> Vec<(String, Value)> {
        self.worker_calls.lock().expect("calls lock").clone()
    }

    /// Number of screenshot uploads performed.
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().expect("uploads lock").len()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn chat_step(&self, request: StepRequest) -> Result<StepReply, BackendError> {
        self.step_requests
            .lock()
            .expect("requests lock")
            .push(request);
        let text = self
            .steps
            .lock()
            .expect("steps lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback_step.clone());
        Ok(StepReply {
            text,
            usage: Some(TokenUsage {
                prompt_tokens: 64,
                completion_tokens: 32,
                total_tokens: 96,
            }),
        })
    }

    async fn upload_screenshot(&self, bytes: Vec<u8>) -> Result<HostedImage, BackendError> {
        self.uploads.lock().expect("uploads lock").push(bytes.len());
        let uuid = Uuid::new_v4().to_string();
        let url = format!("https://images.lux.dev/{uuid}.png");
        Ok(HostedImage { uuid, url })
    }

    async fn call_worker(
        &self,
        worker: &str,
        payload: Value,
    ) -> Result<WorkerReply, BackendError> {
        self.worker_calls
            .lock()
            .expect("calls lock")
            .push((worker.to_string(), payload));
        let text = self
            .worker_replies
            .lock()
            .expect("worker lock")
            .pop_front()
            .unwrap_or_else(|| "{}".to_string());
        Ok(WorkerReply {
            text,
            request_id: Uuid::new_v4().to_string(),
        })
    }
}
