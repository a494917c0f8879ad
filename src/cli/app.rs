use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::commands::Commands;
use super::config::cmd_config;
use super::context::CliContext;
use super::env::CliArgs;
use super::parse::cmd_parse;
use super::run::cmd_run;
use super::runtime::{
    apply_runtime_overrides, init_logging, load_config, load_local_env_overrides, LoadedConfig,
};

pub async fn run() -> Result<()> {
    load_local_env_overrides();
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_json)?;

    info!("Starting Lux CLI v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_ref()).await?;
    apply_runtime_overrides(&loaded.config);
    let LoadedConfig { config, path } = loaded;
    let ctx = CliContext::new(config, path);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, &ctx).await,
        Commands::Parse(args) => cmd_parse(args).await,
        Commands::Config(args) => cmd_config(args, &ctx).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {}", err);
            Err(err)
        }
    }
}
