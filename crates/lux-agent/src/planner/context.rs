//! Payload assembly for worker calls.
//!
//! Memory-backed and ad-hoc contexts share one payload schema so every
//! worker sees the same keys regardless of who initiated the call.

use serde_json::{json, Value};

use crate::memory::{ActionRecord, PlannerMemory};
use crate::planner::ContextMap;
use crate::screenshot::ResolvedScreenshot;

/// Build the shared `context` object for a worker payload.
///
/// Ad-hoc entries from `extra` are merged last and win over the
/// memory-derived view on key collisions.
pub(crate) fn build_context(
    memory: Option<&PlannerMemory>,
    todo_index: Option<usize>,
    extra: &ContextMap,
) -> Value {
    let mut context = match memory {
        Some(memory) => json!({
            "task": memory.task_description(),
            "todos": memory.todos(),
            "todo_summaries": memory.todo_summaries(),
            "overall_summary": memory.overall_summary(),
        }),
        None => Value::Object(ContextMap::new()),
    };
    if let (Value::Object(object), Some(index)) = (&mut context, todo_index) {
        object.insert("current_todo_index".to_string(), json!(index));
    }
    if let Value::Object(object) = &mut context {
        for (key, value) in extra {
            object.insert(key.clone(), value.clone());
        }
    }
    context
}

fn attach_screenshot(payload: &mut Value, screenshot: Option<&ResolvedScreenshot>) {
    if let (Value::Object(object), Some(shot)) = (payload, screenshot) {
        object.insert(
            "screenshot".to_string(),
            json!({ "url": shot.url, "uuid": shot.uuid }),
        );
    }
}

pub(crate) fn plan_payload(
    todo: &str,
    context: Value,
    screenshot: Option<&ResolvedScreenshot>,
) -> Value {
    let mut payload = json!({ "todo": todo, "context": context });
    attach_screenshot(&mut payload, screenshot);
    payload
}

pub(crate) fn reflect_payload(
    instruction: &str,
    actions: &[ActionRecord],
    context: Value,
    screenshot: Option<&ResolvedScreenshot>,
) -> Value {
    let mut payload = json!({
        "instruction": instruction,
        "actions": actions,
        "context": context,
    });
    attach_screenshot(&mut payload, screenshot);
    payload
}

pub(crate) fn summary_payload(actions: &[ActionRecord], context: Value) -> Value {
    json!({ "actions": actions, "context": context })
}
