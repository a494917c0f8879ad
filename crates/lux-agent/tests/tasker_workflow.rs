use lux_agent::{
    Agent, AgentConfig, AgentError, EventKind, EventLevel, MemoryObserver, RecordingExecutor,
    ScriptedBackend, SplitPhase, StaticScreenshots, Tasker, TodoStatus,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SHOT: &str = "https://images.lux.dev/6f9619ff-8b86-4011-b042-31c97f110af4.png";

fn fixtures() -> (
    Arc<ScriptedBackend>,
    Arc<MemoryObserver>,
    Arc<RecordingExecutor>,
    Arc<StaticScreenshots>,
) {
    (
        Arc::new(ScriptedBackend::new()),
        Arc::new(MemoryObserver::new()),
        Arc::new(RecordingExecutor::new()),
        Arc::new(StaticScreenshots::from_urls([SHOT])),
    )
}

#[tokio::test]
async fn todos_run_in_order_and_fold_into_memory() {
    let (backend, observer, executor, screenshots) = fixtures();
    backend.queue_worker_reply(r#"{"subtodos": ["todo one", "todo two"], "reasoning": "split into two"}"#);
    backend.queue_worker_reply(r#"{"instruction": "do one"}"#);
    backend.queue_worker_reply(r#"{"summary": "one done"}"#);
    backend.queue_worker_reply(r#"{"instruction": "do two"}"#);
    backend.queue_worker_reply(r#"{"summary": "two done"}"#);

    let mut tasker = Tasker::new(backend.clone(), AgentConfig::minimal())
        .expect("tasker")
        .with_observer(observer.clone());
    let overall = tasker
        .execute("organize the desktop", executor, screenshots)
        .await
        .expect("execute");
    assert!(overall);

    let memory = tasker.memory();
    assert_eq!(memory.todos().len(), 2);
    assert!(memory
        .todos()
        .iter()
        .all(|todo| todo.status == TodoStatus::Completed));
    assert_eq!(memory.history().len(), 2);
    assert_eq!(memory.history()[0].summary.as_deref(), Some("one done"));
    assert!(memory.history().iter().all(|entry| entry.completed));
    assert_eq!(
        memory.overall_summary(),
        "- todo one: one done\n- todo two: two done"
    );

    // Seed plan, then one plan and one summary per todo.
    let calls = backend.worker_calls();
    let workers: Vec<&str> = calls.iter().map(|(worker, _)| worker.as_str()).collect();
    assert_eq!(
        workers,
        vec![
            "initial_plan",
            "initial_plan",
            "summarization",
            "initial_plan",
            "summarization"
        ]
    );
    assert_eq!(
        calls[0].1.get("todo").and_then(|v| v.as_str()),
        Some("organize the desktop")
    );

    let splits: Vec<(usize, SplitPhase)> = observer
        .snapshot()
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::Split {
                todo_index, phase, ..
            } => Some((*todo_index, *phase)),
            _ => None,
        })
        .collect();
    assert_eq!(
        splits,
        vec![
            (0, SplitPhase::Begin),
            (0, SplitPhase::End),
            (1, SplitPhase::Begin),
            (1, SplitPhase::End)
        ]
    );
}

#[tokio::test]
async fn fatal_executor_failure_stops_the_workflow() {
    let (backend, observer, executor, screenshots) = fixtures();
    backend.queue_worker_reply(r#"{"subtodos": ["first", "second"]}"#);
    backend.queue_worker_reply("{}");
    backend.queue_step("<action>click(oops)</action>");

    let mut tasker = Tasker::new(backend.clone(), AgentConfig::minimal())
        .expect("tasker")
        .with_observer(observer.clone());
    let overall = tasker
        .execute("two part task", executor, screenshots)
        .await
        .expect("execute");
    assert!(!overall);

    // The failed todo keeps its in-progress state and the rest never runs.
    let memory = tasker.memory();
    assert_eq!(memory.todos()[0].status, TodoStatus::InProgress);
    assert_eq!(memory.todos()[1].status, TodoStatus::Pending);
    assert!(memory.history().is_empty());

    let calls = backend.worker_calls();
    let workers: Vec<&str> = calls.iter().map(|(worker, _)| worker.as_str()).collect();
    assert_eq!(workers, vec!["initial_plan", "initial_plan"]);
    assert_eq!(backend.step_requests().len(), 1);

    assert!(observer
        .snapshot()
        .iter()
        .any(|event| matches!(&event.kind, EventKind::Log { level: EventLevel::Error, .. })));
}

#[tokio::test]
async fn exhausted_todo_is_skipped_after_attempt_budget() {
    let (backend, observer, executor, screenshots) = fixtures();
    backend.queue_worker_reply(r#"{"subtodos": ["only todo"]}"#);
    backend.queue_worker_reply("{}");
    backend.queue_step("<think>still going</think>\n<action>click(10, 10)</action>");
    backend.queue_worker_reply(r#"{"summary": "incomplete"}"#);

    let config = AgentConfig::minimal()
        .with_max_steps(1)
        .with_max_todo_attempts(1);
    let mut tasker = Tasker::new(backend.clone(), config)
        .expect("tasker")
        .with_observer(observer.clone());
    let overall = tasker
        .execute("one stubborn task", executor, screenshots)
        .await
        .expect("execute");
    assert!(!overall);

    let memory = tasker.memory();
    assert_eq!(memory.todos()[0].status, TodoStatus::Skipped);
    assert_eq!(memory.history().len(), 1);
    assert!(!memory.history()[0].completed);
    // Nothing completed, so the rolling summary stays empty.
    assert_eq!(memory.overall_summary(), "");

    assert!(observer.snapshot().iter().any(|event| matches!(
        &event.kind,
        EventKind::Log { level: EventLevel::Warn, message } if message.contains("skipping todo 0")
    )));
}

#[tokio::test]
async fn discovered_subtodos_are_appended_and_run() {
    let (backend, _observer, executor, screenshots) = fixtures();
    backend.queue_worker_reply(r#"{"subtodos": ["original"]}"#);
    backend.queue_worker_reply(r#"{"instruction": "go", "subtodos": ["follow-up check"]}"#);
    backend.queue_worker_reply(r#"{"summary": "did it"}"#);
    backend.queue_worker_reply("{}");
    backend.queue_worker_reply(r#"{"summary": "checked"}"#);

    let mut tasker = Tasker::new(backend.clone(), AgentConfig::minimal()).expect("tasker");
    let overall = tasker
        .execute("task that grows", executor, screenshots)
        .await
        .expect("execute");
    assert!(overall);

    let memory = tasker.memory();
    assert_eq!(memory.todos().len(), 2);
    assert_eq!(memory.todos()[1].description, "follow-up check");
    assert!(memory
        .todos()
        .iter()
        .all(|todo| todo.status == TodoStatus::Completed));
    assert_eq!(memory.history().len(), 2);
}

#[tokio::test]
async fn empty_plan_falls_back_to_single_todo() {
    let (backend, _observer, executor, screenshots) = fixtures();
    backend.queue_worker_reply("{}");
    backend.queue_worker_reply("{}");
    backend.queue_worker_reply(r#"{"summary": "done in one"}"#);

    let mut tasker = Tasker::new(backend.clone(), AgentConfig::minimal()).expect("tasker");
    let overall = tasker
        .execute("simple task", executor, screenshots)
        .await
        .expect("execute");
    assert!(overall);

    let memory = tasker.memory();
    assert_eq!(memory.todos().len(), 1);
    assert_eq!(memory.todos()[0].description, "simple task");
    assert_eq!(memory.todos()[0].status, TodoStatus::Completed);
}

#[tokio::test]
async fn cancellation_interrupts_the_workflow() {
    let (backend, _observer, executor, screenshots) = fixtures();
    backend.queue_worker_reply(r#"{"subtodos": ["a"]}"#);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut tasker = Tasker::new(backend.clone(), AgentConfig::minimal())
        .expect("tasker")
        .with_cancellation(cancel);
    let err = tasker
        .execute("anything", executor, screenshots)
        .await
        .expect_err("must be interrupted");
    assert!(matches!(err, AgentError::Interrupted));
}
