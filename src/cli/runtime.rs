use std::env;
use std::fs as stdfs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs;
use serde_yaml;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::remote::DEFAULT_BASE_URL;

const LOCAL_ENV_FILE: &str = "config/local.env";

/// Seed the process environment from `config/local.env` without ever
/// overriding variables that are already set.
pub fn load_local_env_overrides() {
    let path = Path::new(LOCAL_ENV_FILE);
    let contents = match stdfs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return,
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read local.env overrides");
            return;
        }
    };

    let mut applied = 0usize;
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line = idx + 1, "invalid local.env entry; skipping");
            continue;
        };
        let key = key.trim();
        if key.is_empty() || env::var(key).is_ok() {
            continue;
        }
        env::set_var(key, unescape_value(value.trim()));
        applied += 1;
    }
    info!(path = %path.display(), applied, "Loaded environment overrides from local.env");
}

pub fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
}

/// The working-directory file wins over the per-user one so a checkout can
/// carry its own settings.
fn resolve_config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let local = PathBuf::from("config/lux.yaml");
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("lux");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = resolve_config_path(config_path)?;
    if !path.exists() {
        warn!(
            "Config file not found, using defaults: {}",
            path.display()
        );
        return Ok(LoadedConfig {
            config: AppConfig::default(),
            path,
        });
    }

    let content = fs::read_to_string(&path)
        .await
        .context("Failed to read config file")?;
    let config: AppConfig =
        serde_yaml::from_str(&content).context("Failed to parse config file")?;
    info!("Loaded configuration from: {}", path.display());
    Ok(LoadedConfig { config, path })
}

/// Promote file-level settings into the environment the remote client
/// reads, keeping explicitly exported variables authoritative.
pub fn apply_runtime_overrides(config: &AppConfig) {
    if env::var("LUX_BASE_URL").is_err() && config.base_url != DEFAULT_BASE_URL {
        env::set_var("LUX_BASE_URL", &config.base_url);
        info!("Using API base URL from config: {}", config.base_url);
    }
}

fn unescape_value(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };
    inner
        .replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
}
