//! Action replay contract and the executors shipped with the SDK.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::errors::ExecutionError;
use lux_protocol::{parse_coords, parse_drag_coords, parse_scroll, Action, ActionType};

/// Size of the normalized coordinate space on both axes.
pub const COORD_SPACE: u32 = 1000;

/// Map a normalized point onto a screen of the given pixel size.
///
/// The result is clamped one pixel inside every edge so replay backends
/// never receive the literal minimum or maximum pixel coordinate.
pub fn project_to_screen(x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
    let clamp_axis = |value: u32, size: u32| -> u32 {
        let scaled = (value as u64 * size as u64 / COORD_SPACE as u64) as u32;
        let upper = size.saturating_sub(2).max(1);
        scaled.clamp(1, upper)
    };
    (clamp_axis(x, width), clamp_axis(y, height))
}

/// Replays model actions against a desktop.
///
/// Implementations must replay each action `count` times, in list order,
/// finishing one action before starting the next. `reset` is called at the
/// start of every fresh task and after any step containing `finish`.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, actions: &[Action]) -> Result<(), ExecutionError>;

    /// Clear transient replay state (held keys, drag anchors).
    async fn reset(&self) -> Result<(), ExecutionError> {
        Ok(())
    }
}

/// Executor that accepts everything and touches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutor;

#[async_trait]
impl ActionExecutor for NoopExecutor {
    async fn execute(&self, actions: &[Action]) -> Result<(), ExecutionError> {
        debug!(count = actions.len(), "noop executor discarding actions");
        Ok(())
    }
}

/// One replayed repetition recorded by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayedAction {
    pub action_type: ActionType,
    pub argument: String,
}

/// Executor that validates arguments and records every repetition instead
/// of driving a real desktop. Backs the CLI dry-run mode and the tests.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    log: Mutex<Vec<ReplayedAction>>,
    resets: AtomicU32,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replayed repetitions observed so far, in order.
    pub fn records(&self) -> Vec<ReplayedAction> {
        self.log.lock().expect("log lock").clone()
    }

    pub fn reset_count(&self) -> u32 {
        self.resets.load(Ordering::SeqCst)
    }
}

fn validate(action: &Action) -> Result<(), ExecutionError> {
    match action.action_type {
        ActionType::Click
        | ActionType::LeftDouble
        | ActionType::LeftTriple
        | ActionType::RightSingle => {
            parse_coords(&action.argument).map(|_| ()).ok_or_else(|| {
                ExecutionError::invalid_argument(action.to_string(), "expected x, y coordinates")
            })
        }
        ActionType::Drag => parse_drag_coords(&action.argument).map(|_| ()).ok_or_else(|| {
            ExecutionError::invalid_argument(action.to_string(), "expected x1, y1, x2, y2")
        }),
        ActionType::Scroll => parse_scroll(&action.argument).map(|_| ()).ok_or_else(|| {
            ExecutionError::invalid_argument(action.to_string(), "expected x,y,direction")
        }),
        ActionType::Hotkey => {
            if action.argument.trim().is_empty() {
                Err(ExecutionError::invalid_argument(
                    action.to_string(),
                    "expected a key combination",
                ))
            } else {
                Ok(())
            }
        }
        ActionType::Type | ActionType::Wait | ActionType::Finish | ActionType::CallUser => Ok(()),
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, actions: &[Action]) -> Result<(), ExecutionError> {
        for action in actions {
            validate(action)?;
            let mut log = self.log.lock().expect("log lock");
            for _ in 0..action.count {
                log.push(ReplayedAction {
                    action_type: action.action_type,
                    argument: action.argument.clone(),
                });
            }
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), ExecutionError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
