//! HTTP adapter binding the agent runtime to the hosted Lux API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::schema::{
    self, ScreenshotUploadBody, ScreenshotUploadReply, StepCallBody, StepCallReply,
    WorkerCallBody, WorkerCallReply,
};
use lux_agent::{BackendError, HostedImage, ModelBackend, StepReply, StepRequest, WorkerReply};

/// Default API base when `LUX_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://api.lux.dev";

/// Default request deadline. Step completions on large screenshots can
/// take tens of seconds, so this errs on the generous side.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the hosted API.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read settings from `LUX_API_KEY` and `LUX_BASE_URL`, failing fast
    /// when the key is missing.
    pub fn from_env() -> Result<Self, BackendError> {
        let api_key =
            env::var("LUX_API_KEY").map_err(|_| BackendError::config("LUX_API_KEY is not set"))?;
        let base_url = env::var("LUX_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `ModelBackend` implementation speaking the hosted HTTP API.
pub struct HttpBackend {
    client: Client,
    config: RemoteConfig,
}

impl HttpBackend {
    pub fn new(config: RemoteConfig) -> Result<Self, BackendError> {
        if config.api_key.trim().is_empty() {
            return Err(BackendError::config("API key is empty"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| BackendError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(RemoteConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| classify_send_error(&err, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            let message = schema::error_message(&text).unwrap_or(text);
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(url = %url, message = %message, "rate limited by the Lux API");
            }
            return Err(BackendError::http(status.as_u16(), message));
        }

        response
            .json::<R>()
            .await
            .map_err(|err| BackendError::schema(format!("invalid reply from {path}: {err}")))
    }
}

fn classify_send_error(err: &reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        BackendError::transport(err.to_string())
    }
}

#[async_trait]
impl ModelBackend for HttpBackend {
    async fn chat_step(&self, request: StepRequest) -> Result<StepReply, BackendError> {
        debug!(
            model = %request.model,
            task_id = %request.task_id,
            turns = request.messages.len(),
            "posting step completion"
        );
        let body = StepCallBody {
            model: request.model,
            task_id: request.task_id,
            messages: request.messages,
            temperature: request.temperature,
        };
        let reply: StepCallReply = self.post_json("/v1/actor/steps", &body).await?;
        Ok(StepReply {
            text: reply.text,
            usage: reply.usage.map(Into::into),
        })
    }

    async fn upload_screenshot(&self, bytes: Vec<u8>) -> Result<HostedImage, BackendError> {
        debug!(bytes = bytes.len(), "uploading screenshot");
        let body = ScreenshotUploadBody {
            image: Base64.encode(&bytes),
            format: "png".to_string(),
        };
        let reply: ScreenshotUploadReply = self.post_json("/v1/screenshots", &body).await?;
        Ok(HostedImage {
            uuid: reply.uuid,
            url: reply.url,
        })
    }

    async fn call_worker(&self, worker: &str, payload: Value) -> Result<WorkerReply, BackendError> {
        debug!(worker = %worker, "calling planning worker");
        let path = format!("/v1/workers/{worker}");
        let body = WorkerCallBody { payload };
        let reply: WorkerCallReply = self.post_json(&path, &body).await?;
        Ok(WorkerReply {
            text: reply.text,
            request_id: reply
                .request_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }
}
