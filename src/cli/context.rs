use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;

/// Shared state handed to every command.
pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
