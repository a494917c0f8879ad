//! Parsers for the delimited reply format emitted by the model.
//!
//! A reply carries an optional reasoning span and an action span:
//!
//! ```text
//! <think>the search box is at the top</think>
//! <action>click(512, 88) & type(rust book) & hotkey(enter)</action>
//! ```
//!
//! Parsing is tolerant: missing spans become empty strings and individual
//! action tokens that fail to parse are dropped from the result (logged at
//! debug level), never surfaced as errors.

use crate::action::{Action, ActionType};
use crate::step::Step;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Opening delimiter of the reasoning span.
pub const THINK_START: &str = "<think>";
/// Closing delimiter of the reasoning span.
pub const THINK_END: &str = "</think>";
/// Opening delimiter of the action span.
pub const ACTION_START: &str = "<action>";
/// Closing delimiter of the action span.
pub const ACTION_END: &str = "</action>";

static THINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "(?s){}(.*?){}",
        regex::escape(THINK_START),
        regex::escape(THINK_END)
    ))
    .expect("valid reasoning regex")
});

static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "(?s){}(.*?){}",
        regex::escape(ACTION_START),
        regex::escape(ACTION_END)
    ))
    .expect("valid action regex")
});

static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\w+)\((.*)\)$").expect("valid call regex"));

fn first_span<'a>(re: &Regex, text: &'a str) -> &'a str {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("")
}

/// First reasoning span in `text`, trimmed; empty when absent.
pub fn reasoning_span(text: &str) -> &str {
    first_span(&THINK_RE, text)
}

/// First action span in `text`, trimmed; empty when absent.
pub fn action_span(text: &str) -> &str {
    first_span(&ACTION_RE, text)
}

/// Split an action span into individual call tokens on `&`, ignoring any
/// `&` nested inside parentheses.
///
/// Known limitation: a literal `&` inside a `type(...)` argument still
/// splits, since the splitter tracks parentheses only.
pub fn split_actions(block: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth: u32 = 0;
    let mut start = 0;
    for (i, ch) in block.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '&' if depth == 0 => {
                let token = block[start..i].trim();
                if !token.is_empty() {
                    tokens.push(token);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = block[start..].trim();
    if !tail.is_empty() {
        tokens.push(tail);
    }
    tokens
}

fn coerce_count(raw: i64) -> u32 {
    raw.clamp(1, u32::MAX as i64) as u32
}

/// Parse one `name(args)` token into a typed action.
///
/// Returns `None` for unknown names, malformed calls, and scroll calls
/// whose argument is not exactly four fields.
pub fn parse_action(token: &str) -> Option<Action> {
    let caps = CALL_RE.captures(token.trim())?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();
    let raw_args = caps.get(2)?.as_str().trim();
    let action_type = ActionType::from_name(&name)?;

    match action_type {
        ActionType::Hotkey => Some(parse_hotkey(raw_args)),
        ActionType::Scroll => parse_scroll_call(raw_args),
        _ => Some(Action::new(action_type, raw_args)),
    }
}

/// A trailing comma-separated integer on a hotkey is its repeat count and is
/// stripped from the stored argument; any other trailing field is kept.
fn parse_hotkey(raw_args: &str) -> Action {
    if let Some((head, tail)) = raw_args.rsplit_once(',') {
        if let Ok(n) = tail.trim().parse::<i64>() {
            return Action::new(ActionType::Hotkey, head.trim()).with_count(coerce_count(n));
        }
    }
    Action::new(ActionType::Hotkey, raw_args)
}

/// Scroll arguments are exactly `x, y, direction, count`; the first three
/// fields are normalized to a compact `x,y,direction` argument and the
/// fourth becomes the repeat count.
fn parse_scroll_call(raw_args: &str) -> Option<Action> {
    let fields: Vec<&str> = raw_args.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        debug!(args = %raw_args, "scroll requires exactly four fields");
        return None;
    }
    let count = fields[3].parse::<i64>().map(coerce_count).unwrap_or(1);
    Some(Action::new(ActionType::Scroll, fields[..3].join(",")).with_count(count))
}

/// Parse a full model reply into a [`Step`].
///
/// Never fails: absent spans yield an empty reason and no actions, and
/// unparseable tokens are dropped from the action list.
pub fn parse_step(text: &str) -> Step {
    let reason = reasoning_span(text);
    let reason = (!reason.is_empty()).then(|| reason.to_string());

    let mut actions = Vec::new();
    for token in split_actions(action_span(text)) {
        match parse_action(token) {
            Some(action) => actions.push(action),
            None => debug!(token = %token, "dropping unparseable action token"),
        }
    }
    Step::new(reason, actions)
}
