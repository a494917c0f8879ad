//! Agent execution engine for Lux vision models.
//!
//! Provides the step-loop actor, the hierarchical tasker/taskee workflow,
//! planner workers, shared workflow memory, and the traits an embedding
//! application implements: model backend, action executor, screenshot
//! provider, and event observer.

pub mod actor;
pub mod agent;
pub mod backend;
pub mod config;
pub mod errors;
pub mod events;
pub mod executor;
pub mod memory;
pub mod planner;
pub mod registry;
pub mod screenshot;
pub mod taskee;
pub mod tasker;

pub use actor::Actor;
pub use agent::{Agent, FlatAgent};
pub use backend::{
    ChatRole, ChatTurn, HostedImage, ModelBackend, ScriptedBackend, StepReply, StepRequest,
    WorkerReply,
};
pub use config::{model_step_ceiling, AgentConfig, DEFAULT_MODEL};
pub use errors::{AgentError, BackendError, ExecutionError, ScreenshotError};
pub use events::{
    AgentEvent, EventKind, EventLevel, MemoryObserver, NullObserver, Observer, SplitPhase,
};
pub use executor::{
    project_to_screen, ActionExecutor, NoopExecutor, RecordingExecutor, ReplayedAction,
    COORD_SPACE,
};
pub use memory::{
    ActionRecord, ActionRecordKind, PlannerMemory, Todo, TodoHistory, TodoStatus,
};
pub use planner::{
    ContextMap, Planner, PlannerOutput, ReflectionOutput, WorkerIds,
};
pub use registry::{AgentFactory, AgentParams, AgentRegistry};
pub use screenshot::{
    extract_image_uuid, resolve_screenshot, ResolvedScreenshot, Screenshot, ScreenshotProvider,
    StaticScreenshots,
};
pub use taskee::{ExecutionResult, Taskee};
pub use tasker::Tasker;
