//! Lux command-line client library
//!
//! Exposes modules for integration testing

pub mod cli;
pub mod config;
pub mod export;
pub mod remote;
pub mod screenshots;

// Re-export commonly used types for external use
pub use config::AppConfig;
pub use export::{render_json, render_markdown, write_report, RunReport};
pub use remote::{HttpBackend, RemoteConfig};
pub use screenshots::FileScreenshots;
