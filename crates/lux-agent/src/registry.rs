//! Name-based construction of agents, for CLI and embedding use.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, FlatAgent};
use crate::backend::ModelBackend;
use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::events::{NullObserver, Observer};
use crate::tasker::Tasker;

/// Everything a factory needs to assemble an agent.
#[derive(Clone)]
pub struct AgentParams {
    pub backend: Arc<dyn ModelBackend>,
    pub config: AgentConfig,
    pub observer: Arc<dyn Observer>,
    pub cancel: CancellationToken,
}

impl AgentParams {
    pub fn new(backend: Arc<dyn ModelBackend>, config: AgentConfig) -> Self {
        Self {
            backend,
            config,
            observer: Arc::new(NullObserver),
            cancel: CancellationToken::new(),
        }
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

pub type AgentFactory = Box<dyn Fn(AgentParams) -> Result<Box<dyn Agent>, AgentError> + Send + Sync>;

/// Registry mapping agent mode names to constructors.
pub struct AgentRegistry {
    factories: BTreeMap<String, AgentFactory>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the built-in agent modes.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.insert("flat", |params| {
            let agent = FlatAgent::new(params.backend, params.config)?
                .with_observer(params.observer)
                .with_cancellation(params.cancel);
            Ok(Box::new(agent))
        });
        registry.insert("tasker", |params| {
            let agent = Tasker::new(params.backend, params.config)?
                .with_observer(params.observer)
                .with_cancellation(params.cancel);
            Ok(Box::new(agent))
        });
        registry
    }

    fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(AgentParams) -> Result<Box<dyn Agent>, AgentError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Register a factory under `name`. Duplicate names are rejected.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), AgentError>
    where
        F: Fn(AgentParams) -> Result<Box<dyn Agent>, AgentError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(AgentError::config(format!(
                "agent mode '{name}' is already registered"
            )));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Build an agent for `name`, or a config error naming the known modes.
    pub fn create(&self, name: &str, params: AgentParams) -> Result<Box<dyn Agent>, AgentError> {
        let factory = self.factories.get(name).ok_or_else(|| {
            AgentError::config(format!(
                "unknown agent mode '{name}' (available: {})",
                self.names().join(", ")
            ))
        })?;
        factory(params)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;

    fn params() -> AgentParams {
        AgentParams::new(Arc::new(ScriptedBackend::new()), AgentConfig::minimal())
    }

    #[test]
    fn builtin_modes_construct() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.names(), vec!["flat", "tasker"]);
        assert!(registry.create("flat", params()).is_ok());
        assert!(registry.create("tasker", params()).is_ok());
    }

    #[test]
    fn unknown_mode_is_config_error() {
        let registry = AgentRegistry::builtin();
        let err = registry.create("nested", params()).unwrap_err();
        assert!(err.to_string().contains("unknown agent mode"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = AgentRegistry::new();
        registry
            .register("flat", |params| {
                Ok(Box::new(FlatAgent::new(params.backend, params.config)?))
            })
            .expect("first registration");
        let err = registry
            .register("flat", |params| {
                Ok(Box::new(FlatAgent::new(params.backend, params.config)?))
            })
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }
}
