use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::export::{write_report, RunReport};
use crate::remote::HttpBackend;
use crate::screenshots::FileScreenshots;
use lux_agent::{
    AgentEvent, AgentParams, AgentRegistry, EventKind, MemoryObserver, RecordingExecutor,
    ScreenshotProvider, StaticScreenshots,
};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Natural-language task for the agent
    pub instruction: String,

    /// Agent mode (see `lux run --help` for the built-in set)
    #[arg(short, long, default_value = "tasker")]
    pub mode: String,

    /// Screenshot file served to the model (repeatable, cycles)
    #[arg(long = "screenshot-file", value_name = "PATH")]
    pub screenshot_files: Vec<PathBuf>,

    /// Hosted screenshot URL served to the model (repeatable, cycles)
    #[arg(long = "screenshot-url", value_name = "URL")]
    pub screenshot_urls: Vec<String>,

    /// Override the configured per-task step budget
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Write a run report here; .json or .md by extension
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

/// Drive one agent run against the hosted API.
///
/// Actions are replayed into a recording executor rather than a real
/// desktop, so a run is always a dry run: it shows what the model would
/// do without moving the local cursor.
pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let screenshots = build_screenshots(&args)?;

    let mut agent_config = ctx.config().agent_config();
    if let Some(max_steps) = args.max_steps {
        agent_config = agent_config.with_max_steps(max_steps);
    }

    let backend = Arc::new(HttpBackend::from_env().context("configuring the API client")?);
    let observer = Arc::new(MemoryObserver::new());
    let executor = Arc::new(RecordingExecutor::new());
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current step");
            ctrl_c.cancel();
        }
    });

    let params = AgentParams::new(backend, agent_config)
        .with_observer(observer.clone())
        .with_cancellation(cancel);
    let registry = AgentRegistry::builtin();
    let mut agent = registry.create(&args.mode, params)?;

    info!(mode = %args.mode, instruction = %args.instruction, "starting run");
    let success = agent
        .execute(&args.instruction, executor.clone(), screenshots)
        .await?;

    let events = observer.snapshot();
    let report = RunReport {
        instruction: &args.instruction,
        mode: &args.mode,
        success,
        generated_at: Utc::now(),
        events: &events,
    };

    print_summary(&report, &executor);

    if let Some(path) = &args.export {
        write_report(path, &report)?;
        println!("Run report written to {}", path.display());
    }

    if !success {
        bail!("run finished without completing the task");
    }
    Ok(())
}

fn build_screenshots(args: &RunArgs) -> Result<Arc<dyn ScreenshotProvider>> {
    match (
        args.screenshot_files.is_empty(),
        args.screenshot_urls.is_empty(),
    ) {
        (false, false) => bail!("use either --screenshot-file or --screenshot-url, not both"),
        (true, true) => bail!("at least one --screenshot-file or --screenshot-url is required"),
        (false, true) => Ok(Arc::new(FileScreenshots::new(args.screenshot_files.clone()))),
        (true, false) => Ok(Arc::new(StaticScreenshots::from_urls(
            args.screenshot_urls.iter().cloned(),
        ))),
    }
}

fn print_summary(report: &RunReport<'_>, executor: &RecordingExecutor) {
    let steps = count_steps(report.events);
    let replayed = executor.records();
    println!(
        "Task {}",
        if report.success {
            "completed"
        } else {
            "did not complete"
        }
    );
    println!(
        "Run stats → steps={} actions={} events={}",
        steps,
        replayed.len(),
        report.events.len()
    );
}

fn count_steps(events: &[AgentEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event.kind, EventKind::Step { .. }))
        .count()
}
