use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;

use lux_protocol::parse_step;

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// File containing raw model output; stdin when omitted
    pub file: Option<PathBuf>,

    /// Parse this literal text instead of reading a file
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,
}

/// Parse raw model output and print the typed step as JSON. Debugging aid
/// for the reply grammar: unknown action tokens are dropped, not errors.
pub async fn cmd_parse(args: ParseArgs) -> Result<()> {
    let raw = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        }
    };

    let step = parse_step(&raw);
    println!("{}", serde_json::to_string_pretty(&step)?);
    Ok(())
}
