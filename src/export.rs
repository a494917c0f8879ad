//! Run report renderers behind `lux run --export`.
//!
//! A report is the observer's event stream plus the run verdict. JSON is
//! the machine-readable form; Markdown is a human-readable digest with one
//! section per todo.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use lux_agent::{AgentEvent, EventKind, EventLevel, SplitPhase};

/// Everything a rendered run report carries.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub instruction: &'a str,
    pub mode: &'a str,
    pub success: bool,
    pub generated_at: DateTime<Utc>,
    pub events: &'a [AgentEvent],
}

pub fn render_json(report: &RunReport<'_>) -> Result<String> {
    serde_json::to_string_pretty(report).context("serializing run report")
}

pub fn render_markdown(report: &RunReport<'_>) -> String {
    let mut out = String::new();
    out.push_str("# Lux run report\n\n");
    out.push_str(&format!("- Instruction: {}\n", report.instruction));
    out.push_str(&format!("- Mode: {}\n", report.mode));
    out.push_str(&format!(
        "- Outcome: {}\n",
        if report.success {
            "completed"
        } else {
            "did not complete"
        }
    ));
    out.push_str(&format!(
        "- Generated: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- Events: {}\n", report.events.len()));

    let mut in_section = false;
    for event in report.events {
        match &event.kind {
            EventKind::Split {
                todo_index,
                description,
                phase,
            } => {
                if *phase == SplitPhase::Begin {
                    out.push_str(&format!("\n## Todo {todo_index}: {description}\n"));
                    in_section = true;
                }
            }
            kind => {
                if !in_section {
                    out.push_str("\n## Run\n");
                    in_section = true;
                }
                out.push_str(&event_line(event, kind));
            }
        }
    }
    out
}

fn event_line(event: &AgentEvent, kind: &EventKind) -> String {
    let at = event.at.format("%H:%M:%S");
    match kind {
        EventKind::Step { step, reason, stop } => {
            let marker = if *stop { " (stop)" } else { "" };
            match reason {
                Some(reason) => format!("- {at} step {step}{marker}: {reason}\n"),
                None => format!("- {at} step {step}{marker}\n"),
            }
        }
        EventKind::Action { action } => format!("- {at} action `{action}`\n"),
        EventKind::Plan {
            instruction,
            reasoning,
        } => {
            if reasoning.is_empty() {
                format!("- {at} plan: {instruction}\n")
            } else {
                format!("- {at} plan: {instruction}\n  - reasoning: {reasoning}\n")
            }
        }
        EventKind::Log { level, message } => {
            format!("- {at} {}: {message}\n", level_str(*level))
        }
        // Splits are section boundaries, handled by the caller.
        EventKind::Split { .. } => String::new(),
    }
}

fn level_str(level: EventLevel) -> &'static str {
    match level {
        EventLevel::Info => "info",
        EventLevel::Warn => "warn",
        EventLevel::Error => "error",
    }
}

/// Write the report to `path`, choosing the renderer by file extension.
pub fn write_report(path: &Path, report: &RunReport<'_>) -> Result<()> {
    let rendered = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => render_json(report)?,
        Some("md") | Some("markdown") => render_markdown(report),
        _ => bail!(
            "unsupported export extension for {}; use .json or .md",
            path.display()
        ),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
    }
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
