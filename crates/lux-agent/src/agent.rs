//! Public agent contract and the flat single-task agent.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::actor::Actor;
use crate::backend::ModelBackend;
use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::events::{AgentEvent, EventLevel, NullObserver, Observer};
use crate::executor::ActionExecutor;
use crate::screenshot::{resolve_screenshot, ScreenshotProvider};

/// A runnable agent: flat and hierarchical implementations share this seam.
///
/// `execute` returns whether the instruction was carried out; budget
/// exhaustion is an unsuccessful outcome, not an error.
#[async_trait]
pub trait Agent: Send {
    async fn execute(
        &mut self,
        instruction: &str,
        executor: Arc<dyn ActionExecutor>,
        screenshots: Arc<dyn ScreenshotProvider>,
    ) -> Result<bool, AgentError>;
}

/// Single-task agent driving one conversation without decomposition.
pub struct FlatAgent {
    backend: Arc<dyn ModelBackend>,
    config: AgentConfig,
    observer: Arc<dyn Observer>,
    cancel: CancellationToken,
}

impl FlatAgent {
    pub fn new(backend: Arc<dyn ModelBackend>, config: AgentConfig) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            observer: Arc::new(NullObserver),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl Agent for FlatAgent {
    async fn execute(
        &mut self,
        instruction: &str,
        executor: Arc<dyn ActionExecutor>,
        screenshots: Arc<dyn ScreenshotProvider>,
    ) -> Result<bool, AgentError> {
        executor.reset().await?;
        let mut actor = Actor::new(self.backend.clone(), self.config.model.clone())
            .with_temperature(self.config.temperature);
        actor.init_task(instruction, self.config.max_steps);

        let mut step_number: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Err(AgentError::Interrupted);
            }
            if actor.remaining_steps() == 0 {
                warn!(steps = step_number, "step budget exhausted");
                self.observer
                    .on_event(&AgentEvent::log(EventLevel::Warn, "step budget exhausted"));
                return Ok(false);
            }

            let shot = screenshots.capture().await?;
            let resolved = resolve_screenshot(self.backend.as_ref(), shot).await?;
            let step = actor.step(&resolved.url, None, None).await?;
            step_number += 1;
            self.observer.on_event(&AgentEvent::step(step_number, &step));
            for action in &step.actions {
                self.observer.on_event(&AgentEvent::action(action));
            }
            executor.execute(&step.actions).await?;

            if step.stop {
                executor.reset().await?;
                info!(steps = step_number, "task complete");
                return Ok(true);
            }
            if self.config.step_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.step_delay_ms)).await;
            }
        }
    }
}
