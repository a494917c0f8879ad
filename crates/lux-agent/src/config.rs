//! Agent run configuration and per-model limits.

use crate::errors::AgentError;
use serde::{Deserialize, Serialize};

/// Model requested when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "lux-1";

/// Hard per-task step ceiling enforced for each hosted model.
///
/// Callers may ask for fewer steps; requests above the ceiling are clamped
/// with a warning, never rejected.
pub fn model_step_ceiling(model: &str) -> u32 {
    match model {
        "lux-1" => 100,
        "lux-1-lite" => 40,
        _ => 50,
    }
}

/// Tunable parameters for flat and hierarchical agent runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hosted model identifier
    pub model: String,
    /// Per-task step budget (clamped to the model ceiling)
    pub max_steps: u32,
    /// Actions executed between reflection calls
    pub reflection_interval: u32,
    /// Pause after each executed step, in milliseconds
    pub step_delay_ms: u64,
    /// Sampling temperature forwarded to the backend
    pub temperature: Option<f32>,
    /// Runs attempted per todo before it is skipped
    pub max_todo_attempts: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_steps: 25,
            reflection_interval: 5,
            step_delay_ms: 500,
            temperature: None,
            max_todo_attempts: 2,
        }
    }
}

impl AgentConfig {
    /// Smallest useful configuration, handy for quick experiments.
    pub fn minimal() -> Self {
        Self {
            max_steps: 5,
            reflection_interval: 2,
            step_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Skip inter-step pauses, keep everything else at defaults.
    pub fn fast() -> Self {
        Self {
            step_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_reflection_interval(mut self, interval: u32) -> Self {
        self.reflection_interval = interval;
        self
    }

    pub fn with_step_delay_ms(mut self, delay_ms: u64) -> Self {
        self.step_delay_ms = delay_ms;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_todo_attempts(mut self, attempts: u32) -> Self {
        self.max_todo_attempts = attempts;
        self
    }

    /// Reject configurations that would stall or never run.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.model.trim().is_empty() {
            return Err(AgentError::config("model must not be empty"));
        }
        if self.max_steps == 0 {
            return Err(AgentError::config("max_steps must be at least 1"));
        }
        if self.reflection_interval == 0 {
            return Err(AgentError::config("reflection_interval must be at least 1"));
        }
        if self.max_todo_attempts == 0 {
            return Err(AgentError::config("max_todo_attempts must be at least 1"));
        }
        Ok(())
    }
}
