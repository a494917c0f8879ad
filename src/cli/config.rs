use std::env;

use anyhow::Result;
use clap::Args;
use serde_yaml;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Print the resolved configuration as YAML instead of the summary
    #[arg(long)]
    pub yaml: bool,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();

    if args.yaml {
        print!("{}", serde_yaml::to_string(config)?);
        return Ok(());
    }

    println!("Lux CLI");
    println!("=======");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE", "unknown"));
    println!("Git Commit: {}", env!("GIT_HASH", "unknown"));
    println!();

    println!("Configuration ({}):", ctx.config_path().display());
    println!("- Model: {}", config.model);
    println!("- API Base: {}", config.base_url);
    println!("- Max Steps: {}", config.max_steps);
    println!("- Reflection Interval: {}", config.reflection_interval);
    println!("- Step Delay: {}ms", config.step_delay_ms);
    println!("- Todo Attempts: {}", config.max_todo_attempts);
    match config.temperature {
        Some(temperature) => println!("- Temperature: {temperature}"),
        None => println!("- Temperature: (model default)"),
    }
    println!("- Request Timeout: {}s", config.request_timeout_secs);
    println!();

    println!("Environment:");
    println!(
        "- LUX_API_KEY: {}",
        mask_key(env::var("LUX_API_KEY").ok().as_deref())
    );
    println!(
        "- LUX_BASE_URL: {}",
        env::var("LUX_BASE_URL").unwrap_or_else(|_| "(unset)".to_string())
    );

    Ok(())
}

/// Show enough of the key to recognize it without leaking it.
fn mask_key(key: Option<&str>) -> String {
    match key {
        Some(key) if key.chars().count() > 8 => {
            let prefix: String = key.chars().take(4).collect();
            format!("{prefix}****")
        }
        Some(_) => "(set)".to_string(),
        None => "(unset)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_masked_not_echoed() {
        assert_eq!(mask_key(None), "(unset)");
        assert_eq!(mask_key(Some("short")), "(set)");
        assert_eq!(mask_key(Some("lux-0123456789abcdef")), "lux-****");
    }
}
