//! Lux action protocol primitives.
//!
//! Provides the typed action vocabulary, the per-step model reply format,
//! and the parsers that turn raw model text into executable action lists.

pub mod action;
pub mod coords;
pub mod parser;
pub mod step;

pub use action::{Action, ActionType};
pub use coords::{parse_coords, parse_drag_coords, parse_scroll, ScrollDirection};
pub use parser::{
    action_span, parse_action, parse_step, reasoning_span, split_actions, ACTION_END,
    ACTION_START, THINK_END, THINK_START,
};
pub use step::{Step, TokenUsage};
