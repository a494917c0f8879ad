//! Worker reply parsing with defined fallbacks.
//!
//! Workers reply in free text that usually embeds one JSON object. Parsing
//! never fails outward: each decision type has a documented fallback that
//! keeps the driving state machine moving.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of an initial-plan worker call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub instruction: String,
    pub reasoning: String,
    pub subtodos: Vec<String>,
}

impl PlannerOutput {
    /// Used when the worker reply cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            instruction: String::new(),
            reasoning: "Failed to parse structured response".to_string(),
            subtodos: Vec::new(),
        }
    }
}

/// Outcome of a reflection worker call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflectionOutput {
    /// Keep executing the current instruction unchanged.
    pub continue_current: bool,
    /// Pivot instruction to re-plan the running task with.
    pub new_instruction: Option<String>,
    /// Worker judged the todo already achieved.
    pub success_assessment: bool,
}

impl ReflectionOutput {
    /// Used when the worker reply cannot be parsed: keep going.
    pub fn fallback() -> Self {
        Self {
            continue_current: true,
            new_instruction: None,
            success_assessment: false,
        }
    }
}

/// First balanced `{...}` span in `text`, respecting JSON string syntax.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Deserialize)]
struct WirePlan {
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    subtodos: Vec<String>,
}

/// Parse an initial-plan reply, falling back on any failure.
pub fn parse_plan(text: &str) -> PlannerOutput {
    extract_json_object(text)
        .and_then(|span| serde_json::from_str::<WirePlan>(span).ok())
        .map(|wire| PlannerOutput {
            instruction: wire.instruction.trim().to_string(),
            reasoning: wire.reasoning.trim().to_string(),
            subtodos: wire
                .subtodos
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
        .unwrap_or_else(PlannerOutput::fallback)
}

#[derive(Deserialize)]
struct WireReflection {
    #[serde(default)]
    success: String,
    #[serde(default)]
    subtask_instruction: String,
}

/// Parse a reflection reply into its decision.
///
/// Success requires the worker to answer exactly `yes`; a non-empty
/// `subtask_instruction` pivots the running task; otherwise execution
/// continues unchanged. Unparseable replies continue unchanged.
pub fn parse_reflection(text: &str) -> ReflectionOutput {
    let Some(wire) = extract_json_object(text)
        .and_then(|span| serde_json::from_str::<WireReflection>(span).ok())
    else {
        return ReflectionOutput::fallback();
    };
    let success_assessment = wire.success.trim() == "yes";
    let pivot = wire.subtask_instruction.trim();
    let new_instruction = (!pivot.is_empty()).then(|| pivot.to_string());
    ReflectionOutput {
        continue_current: !success_assessment && new_instruction.is_none(),
        new_instruction,
        success_assessment,
    }
}

/// Parse a summarization reply; unparseable replies are returned verbatim.
pub fn parse_summary(text: &str) -> String {
    extract_json_object(text)
        .and_then(|span| serde_json::from_str::<Value>(span).ok())
        .and_then(|value| {
            value
                .get("summary")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_extraction_handles_noise_and_nesting() {
        let text = "Sure! Here is the plan:\n{\"a\": {\"b\": 2}, \"c\": \"x\"} trailing";
        assert_eq!(
            extract_json_object(text),
            Some("{\"a\": {\"b\": 2}, \"c\": \"x\"}")
        );
    }

    #[test]
    fn json_extraction_ignores_braces_inside_strings() {
        let text = "{\"msg\": \"curly { and } inside\"}";
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn json_extraction_rejects_unterminated_objects() {
        assert_eq!(extract_json_object("{\"open\": true"), None);
        assert_eq!(extract_json_object("no object here"), None);
    }

    #[test]
    fn plan_parsing_reads_fields_and_drops_empty_subtodos() {
        let text = r#"{"instruction": " open the app ", "reasoning": "it is closed", "subtodos": ["a", " ", "b"]}"#;
        let plan = parse_plan(text);
        assert_eq!(plan.instruction, "open the app");
        assert_eq!(plan.reasoning, "it is closed");
        assert_eq!(plan.subtodos, vec!["a", "b"]);
    }

    #[test]
    fn plan_parsing_falls_back_on_garbage() {
        let plan = parse_plan("I could not come up with anything.");
        assert_eq!(plan, PlannerOutput::fallback());
        assert!(plan.instruction.is_empty());
        assert_eq!(plan.reasoning, "Failed to parse structured response");
    }

    #[test]
    fn reflection_success_requires_exact_yes() {
        let out = parse_reflection(r#"{"success": "yes", "subtask_instruction": ""}"#);
        assert!(out.success_assessment);
        assert!(!out.continue_current);
        assert!(out.new_instruction.is_none());

        let out = parse_reflection(r#"{"success": "YES", "subtask_instruction": ""}"#);
        assert!(!out.success_assessment);

        let out = parse_reflection(r#"{"success": "probably", "subtask_instruction": ""}"#);
        assert!(!out.success_assessment);
        assert!(out.continue_current);
    }

    #[test]
    fn reflection_pivots_on_non_empty_instruction() {
        let out =
            parse_reflection(r#"{"success": "no", "subtask_instruction": "scroll further down"}"#);
        assert!(!out.success_assessment);
        assert!(!out.continue_current);
        assert_eq!(out.new_instruction.as_deref(), Some("scroll further down"));
    }

    #[test]
    fn reflection_falls_back_to_continue() {
        let out = parse_reflection("hmm, not sure");
        assert_eq!(out, ReflectionOutput::fallback());
        assert!(out.continue_current);
        assert!(!out.success_assessment);
    }

    #[test]
    fn summary_prefers_structured_field() {
        assert_eq!(
            parse_summary(r#"{"summary": "logged in and opened inbox"}"#),
            "logged in and opened inbox"
        );
    }

    #[test]
    fn summary_falls_back_to_raw_text() {
        assert_eq!(
            parse_summary("The task went fine overall.\n"),
            "The task went fine overall."
        );
        // A JSON object without the expected field also falls back.
        assert_eq!(
            parse_summary(r#"{"note": "irrelevant"}"#),
            r#"{"note": "irrelevant"}"#
        );
    }
}
