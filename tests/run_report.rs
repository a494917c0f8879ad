use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use lux_agent::{
    AgentConfig, AgentParams, AgentRegistry, MemoryObserver, RecordingExecutor, ScriptedBackend,
    StaticScreenshots,
};
use lux_cli::export::{render_markdown, write_report, RunReport};

const SHOT: &str = "https://images.lux.dev/6f9619ff-8b86-4011-b042-31c97f110af4.png";

#[tokio::test]
async fn flat_run_produces_an_exportable_report() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_step("<think>the button is obvious</think><action>click(500, 300)</action>")
            .with_step("<action>finish()</action>"),
    );
    let observer = Arc::new(MemoryObserver::new());
    let executor = Arc::new(RecordingExecutor::new());

    let params =
        AgentParams::new(backend, AgentConfig::minimal()).with_observer(observer.clone());
    let mut agent = AgentRegistry::builtin()
        .create("flat", params)
        .expect("create flat agent");

    let success = agent
        .execute(
            "press the button",
            executor.clone(),
            Arc::new(StaticScreenshots::from_urls([SHOT])),
        )
        .await
        .expect("run");
    assert!(success);
    assert_eq!(executor.records().len(), 2);

    let events = observer.snapshot();
    let report = RunReport {
        instruction: "press the button",
        mode: "flat",
        success,
        generated_at: Utc::now(),
        events: &events,
    };

    let dir = tempfile::tempdir().expect("tempdir");
    let json_path = dir.path().join("report.json");
    write_report(&json_path, &report).expect("write json");

    let raw = std::fs::read_to_string(&json_path).expect("read json");
    let value: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(value["mode"], "flat");
    assert_eq!(value["success"], Value::Bool(true));
    let kinds: Vec<&str> = value["events"]
        .as_array()
        .expect("events array")
        .iter()
        .map(|event| event["type"].as_str().expect("type tag"))
        .collect();
    assert_eq!(kinds, vec!["step", "action", "step", "action"]);
    assert_eq!(
        value["events"][0]["reason"].as_str(),
        Some("the button is obvious")
    );

    let markdown = render_markdown(&report);
    assert!(markdown.contains("- Outcome: completed"));
    assert!(markdown.contains("## Run"));
    assert!(markdown.contains("step 1: the button is obvious"));
    assert!(markdown.contains("step 2 (stop)"));
    assert!(markdown.contains("action `click(500, 300)`"));
}

#[tokio::test]
async fn unknown_mode_surfaces_the_registered_names() {
    let backend = Arc::new(ScriptedBackend::new());
    let params = AgentParams::new(backend, AgentConfig::minimal());
    let err = AgentRegistry::builtin()
        .create("recursive", params)
        .err()
        .expect("unknown mode");
    let message = err.to_string();
    assert!(message.contains("flat"));
    assert!(message.contains("tasker"));
}
