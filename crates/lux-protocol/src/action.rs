//! Typed vocabulary of UI actions produced by the model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of actions the remote model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Click,
    LeftDouble,
    LeftTriple,
    RightSingle,
    Drag,
    Hotkey,
    Type,
    Scroll,
    Wait,
    Finish,
    CallUser,
}

impl ActionType {
    /// Resolve a grammar name (`click`, `left_double`, ...) to a typed kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(Self::Click),
            "left_double" => Some(Self::LeftDouble),
            "left_triple" => Some(Self::LeftTriple),
            "right_single" => Some(Self::RightSingle),
            "drag" => Some(Self::Drag),
            "hotkey" => Some(Self::Hotkey),
            "type" => Some(Self::Type),
            "scroll" => Some(Self::Scroll),
            "wait" => Some(Self::Wait),
            "finish" => Some(Self::Finish),
            "call_user" => Some(Self::CallUser),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::LeftDouble => "left_double",
            Self::LeftTriple => "left_triple",
            Self::RightSingle => "right_single",
            Self::Drag => "drag",
            Self::Hotkey => "hotkey",
            Self::Type => "type",
            Self::Scroll => "scroll",
            Self::Wait => "wait",
            Self::Finish => "finish",
            Self::CallUser => "call_user",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executable action with its raw argument text and repeat count.
///
/// `count` is always at least 1; parser-side coercion collapses zero,
/// negative, and non-integer counts to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub argument: String,
    pub count: u32,
}

impl Action {
    pub fn new(action_type: ActionType, argument: impl Into<String>) -> Self {
        Self {
            action_type,
            argument: argument.into(),
            count: 1,
        }
    }

    /// Set the repeat count, keeping the `count >= 1` invariant.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    /// A bare `finish()` action.
    pub fn finish() -> Self {
        Self::new(ActionType::Finish, "")
    }

    /// A `click(x, y)` action in the normalized coordinate space.
    pub fn click(x: u32, y: u32) -> Self {
        Self::new(ActionType::Click, format!("{x}, {y}"))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.action_type, self.argument)
    }
}
