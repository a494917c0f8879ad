//! Application configuration for the Lux CLI.
//!
//! Loaded from YAML by `cli::runtime::load_config`; every field has a
//! default so a partial file (or no file at all) still resolves.

use serde::{Deserialize, Serialize};

use crate::remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use lux_agent::{AgentConfig, DEFAULT_MODEL};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model identifier sent with every step call.
    pub model: String,
    /// Base URL of the hosted API.
    pub base_url: String,
    /// Per-task step budget.
    pub max_steps: u32,
    /// Steps between reflection checks.
    pub reflection_interval: u32,
    /// Pause between executed steps, in milliseconds.
    pub step_delay_ms: u64,
    /// Times a todo may start before the workflow skips it.
    pub max_todo_attempts: u32,
    /// Sampling temperature forwarded to the model; None keeps the
    /// model's default.
    pub temperature: Option<f32>,
    /// Request deadline for API calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let agent = AgentConfig::default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_steps: agent.max_steps,
            reflection_interval: agent.reflection_interval,
            step_delay_ms: agent.step_delay_ms,
            max_todo_attempts: agent.max_todo_attempts,
            temperature: agent.temperature,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Project the application settings onto the agent runtime config.
    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::default()
            .with_model(self.model.clone())
            .with_max_steps(self.max_steps)
            .with_reflection_interval(self.reflection_interval)
            .with_step_delay_ms(self.step_delay_ms)
            .with_max_todo_attempts(self.max_todo_attempts);
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        config
    }
}
