//! Wire types for the hosted Lux API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lux_agent::ChatTurn;
use lux_protocol::TokenUsage;

/// Body of `POST /v1/actor/steps`.
#[derive(Debug, Serialize)]
pub struct StepCallBody {
    pub model: String,
    pub task_id: String,
    pub messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Reply of `POST /v1/actor/steps`.
#[derive(Debug, Deserialize)]
pub struct StepCallReply {
    pub text: String,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

/// Token accounting as reported on the wire.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<WireUsage> for TokenUsage {
    fn from(wire: WireUsage) -> Self {
        TokenUsage {
            prompt_tokens: wire.prompt_tokens,
            completion_tokens: wire.completion_tokens,
            total_tokens: wire.total_tokens,
        }
    }
}

/// Body of `POST /v1/screenshots`. The image travels base64-encoded.
#[derive(Debug, Serialize)]
pub struct ScreenshotUploadBody {
    pub image: String,
    pub format: String,
}

/// Reply of `POST /v1/screenshots`.
#[derive(Debug, Deserialize)]
pub struct ScreenshotUploadReply {
    pub uuid: String,
    pub url: String,
}

/// Body of `POST /v1/workers/{worker}`.
#[derive(Debug, Serialize)]
pub struct WorkerCallBody {
    pub payload: Value,
}

/// Reply of `POST /v1/workers/{worker}`.
#[derive(Debug, Deserialize)]
pub struct WorkerCallReply {
    pub text: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Pull a human-readable message out of a raw error body, if the body
/// follows the `{"error": {"message": ...}}` envelope.
pub fn error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(raw)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}
