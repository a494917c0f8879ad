pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod env;
pub mod parse;
pub mod run;
pub mod runtime;

pub use commands::Commands;
pub use context::CliContext;
pub use env::CliArgs;
