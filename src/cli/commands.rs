use clap::Subcommand;

use super::config::ConfigArgs;
use super::parse::ParseArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run an agent against the hosted Lux API
    Run(RunArgs),

    /// Parse raw model output and print the typed step as JSON
    Parse(ParseArgs),

    /// Show the resolved configuration and build information
    Config(ConfigArgs),
}
