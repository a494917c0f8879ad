use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;

#[test]
fn parse_command_emits_typed_step_json() {
    let bin = assert_cmd::cargo::cargo_bin!("lux");
    let mut cmd = Command::new(bin);
    let assert = cmd
        .args([
            "parse",
            "--text",
            "<think>the field is on top</think><action>click(500, 120) & finish()</action>",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(extract_json(&stdout)).expect("valid json");

    assert_eq!(value["reason"].as_str(), Some("the field is on top"));
    assert_eq!(value["stop"], Value::Bool(true));
    let actions = value["actions"].as_array().expect("actions");
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0]["action_type"].as_str(), Some("click"));
    assert_eq!(actions[0]["argument"].as_str(), Some("500, 120"));
    assert_eq!(actions[1]["action_type"].as_str(), Some("finish"));
}

#[test]
fn parse_command_drops_unknown_actions() {
    let bin = assert_cmd::cargo::cargo_bin!("lux");
    let mut cmd = Command::new(bin);
    let assert = cmd
        .args([
            "parse",
            "--text",
            "<action>teleport(1, 2) & click(500, 300)</action>",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(extract_json(&stdout)).expect("valid json");
    let actions = value["actions"].as_array().expect("actions");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action_type"].as_str(), Some("click"));
    assert_eq!(value["stop"], Value::Bool(false));
}

#[test]
fn config_command_masks_the_api_key() {
    let bin = assert_cmd::cargo::cargo_bin!("lux");
    let mut cmd = Command::new(bin);
    let assert = cmd
        .arg("config")
        .env("LUX_API_KEY", "lux-0123456789abcdef")
        .env_remove("LUX_BASE_URL")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("LUX_API_KEY: lux-****"));
    assert!(!stdout.contains("0123456789abcdef"));
    assert!(stdout.contains("LUX_BASE_URL: (unset)"));
    assert!(stdout.contains("Model: lux-1"));
}

fn extract_json(output: &str) -> &str {
    let start = output.find('{').expect("json start");
    let end = output.rfind('}').expect("json end");
    &output[start..=end]
}
