//! Retry behavior tests: the three-attempt budget, error_info threading
//! between attempts, and cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;

use common::{InMemoryTaskRepository, RecordingDispatcher, ScriptedCompletion};
use insight_engine::application::{TaskOrchestrator, TaskOutcome};
use insight_engine::domain::models::{PlannedStep, StepStatus, Task, TaskStatus};
use insight_engine::domain::ports::NullMemoryStore;
use insight_engine::services::{
    Planner, PromptBuilder, RetryController, StepExecutor, MAX_ATTEMPTS,
};

fn build_orchestrator(
    completion: Arc<ScriptedCompletion>,
    dispatcher: Arc<RecordingDispatcher>,
    tasks: Arc<InMemoryTaskRepository>,
) -> TaskOrchestrator {
    let prompts = PromptBuilder::new(24_000);
    let planner = Planner::new(completion.clone(), dispatcher.clone(), prompts.clone());
    let executor = StepExecutor::new(
        completion,
        dispatcher,
        tasks.clone(),
        Arc::new(NullMemoryStore),
        prompts,
        Duration::from_secs(5),
    );
    TaskOrchestrator::new(planner, RetryController::new(executor), tasks)
}

fn unknown_ability_answer() -> serde_json::Value {
    json!({
        "thoughts": { "reasoning": "trying foo", "speak": "calling foo" },
        "ability": { "name": "foo", "args": {} }
    })
}

#[tokio::test]
async fn test_unknown_ability_exhausts_exactly_three_attempts() {
    let completion = Arc::new(ScriptedCompletion::new());
    let dispatcher = Arc::new(RecordingDispatcher::new().with_spec("read_file"));
    let tasks = Arc::new(InMemoryTaskRepository::new());

    completion.push_ok(json!({ "plan": [{ "input": "do the thing" }] }));
    for _ in 0..MAX_ATTEMPTS {
        completion.push_ok(unknown_ability_answer());
    }

    let orchestrator = build_orchestrator(completion.clone(), dispatcher.clone(), tasks.clone());
    let task = Task::new("call an ability that does not exist");
    let task_id = task.id;

    let outcome = orchestrator.run(task).await.unwrap();

    let TaskOutcome::Failed { ordinal, error, .. } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(ordinal, 0);
    assert_eq!(error.to_string(), "unknown ability: foo");
    assert_eq!(tasks.task_status(task_id), Some(TaskStatus::Failed));

    // One plan request plus one completion per attempt.
    assert_eq!(completion.request_count(), 1 + MAX_ATTEMPTS as usize);
    assert_eq!(dispatcher.invocation_count("foo"), MAX_ATTEMPTS as usize);

    // Every attempt leaves a failed record with its own attempt number.
    let steps = tasks.list_steps_blocking(task_id);
    assert_eq!(steps.len(), MAX_ATTEMPTS as usize);
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.attempt, i as u32 + 1);
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.error.as_deref(), Some("unknown ability: foo"));
    }
}

#[tokio::test]
async fn test_error_info_threads_into_retry_attempts() {
    let completion = Arc::new(ScriptedCompletion::new());
    let dispatcher = Arc::new(RecordingDispatcher::new().with_spec("read_file"));
    let tasks = Arc::new(InMemoryTaskRepository::new());

    completion.push_ok(json!({ "plan": [{ "input": "do the thing" }] }));
    for _ in 0..MAX_ATTEMPTS {
        completion.push_ok(unknown_ability_answer());
    }

    let orchestrator = build_orchestrator(completion.clone(), dispatcher, tasks.clone());
    let task = Task::new("retry with context");
    let task_id = task.id;

    orchestrator.run(task).await.unwrap();

    let steps = tasks.list_steps_blocking(task_id);
    assert!(steps[0].additional_input.error_info.is_none());
    assert_eq!(
        steps[1].additional_input.error_info.as_deref(),
        Some("unknown ability: foo")
    );
    assert_eq!(
        steps[2].additional_input.error_info.as_deref(),
        Some("unknown ability: foo")
    );

    // The retry prompts surface the prior failure; the first does not.
    assert!(!completion.user_prompt(1).contains("unknown ability: foo"));
    assert!(completion.user_prompt(2).contains("unknown ability: foo"));
    assert!(completion.user_prompt(3).contains("unknown ability: foo"));
}

#[tokio::test]
async fn test_step_succeeds_on_final_attempt() {
    let completion = Arc::new(ScriptedCompletion::new());
    let dispatcher = Arc::new(RecordingDispatcher::new().with_spec("select_from_table"));
    let tasks = Arc::new(InMemoryTaskRepository::new());

    completion.push_ok(json!({ "plan": [{ "input": "query the table" }] }));
    for _ in 0..MAX_ATTEMPTS {
        completion.push_ok(json!({
            "thoughts": { "reasoning": "querying", "speak": "running query" },
            "ability": { "name": "select_from_table", "args": { "query": "SELECT 1" } }
        }));
    }
    dispatcher.queue_failure("select_from_table", "connection reset");
    dispatcher.queue_failure("select_from_table", "connection reset");
    dispatcher.queue_ok("select_from_table", json!({ "n_rows": 1 }));

    let orchestrator = build_orchestrator(completion, dispatcher, tasks.clone());
    let task = Task::new("flaky query");
    let task_id = task.id;

    let outcome = orchestrator.run(task).await.unwrap();
    assert!(matches!(outcome, TaskOutcome::Completed { .. }));
    assert_eq!(tasks.task_status(task_id), Some(TaskStatus::Completed));

    let steps = tasks.list_steps_blocking(task_id);
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert_eq!(steps[1].status, StepStatus::Failed);
    assert_eq!(steps[2].status, StepStatus::Completed);
    assert_eq!(steps[2].result, Some(json!({ "n_rows": 1 })));
}

#[tokio::test]
async fn test_cancellation_aborts_an_in_flight_attempt() {
    let completion = Arc::new(ScriptedCompletion::new());
    let dispatcher = Arc::new(RecordingDispatcher::new().with_spec("read_file"));
    let tasks = Arc::new(InMemoryTaskRepository::new());

    completion.push_ok(json!({ "plan": [{ "input": "a step that hangs" }] }));
    completion.push_stall();

    let orchestrator = build_orchestrator(completion.clone(), dispatcher.clone(), tasks.clone());
    let task = Task::new("cancel while the model is thinking");
    let task_id = task.id;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let run = orchestrator.run_with_cancel(task, cancel_rx);
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_tx.send(true).unwrap();
    };
    let (outcome, ()) = tokio::join!(run, trigger);

    assert!(matches!(
        outcome.unwrap(),
        TaskOutcome::Cancelled { ordinal: 0 }
    ));
    assert_eq!(tasks.task_status(task_id), Some(TaskStatus::Cancelled));

    // The abandoned attempt left its persisted row but no retry followed
    // and the ability never ran.
    assert_eq!(tasks.step_count(), 1);
    assert_eq!(completion.request_count(), 2);
    assert!(dispatcher.invocations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dispatch_timeout_feeds_next_attempt_error_info() {
    let completion = Arc::new(ScriptedCompletion::new());
    let dispatcher = Arc::new(RecordingDispatcher::new().with_spec("select_from_table"));
    let tasks = Arc::new(InMemoryTaskRepository::new());

    for _ in 0..2 {
        completion.push_ok(json!({
            "thoughts": { "reasoning": "querying", "speak": "running query" },
            "ability": { "name": "select_from_table", "args": { "query": "SELECT 1" } }
        }));
    }
    dispatcher.queue_stall("select_from_table");
    dispatcher.queue_ok("select_from_table", json!({ "n_rows": 2 }));

    let executor = StepExecutor::new(
        completion,
        dispatcher,
        tasks.clone(),
        Arc::new(NullMemoryStore),
        PromptBuilder::new(24_000),
        Duration::from_millis(50),
    );
    let retry = RetryController::new(executor);

    let task = Task::new("query a stuck backend");
    let planned = PlannedStep::new("query slowly");
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    let step = retry
        .execute_with_retry(&task, &planned, 0, true, &mut cancel_rx)
        .await
        .expect("second attempt succeeds after the timeout");
    drop(cancel_tx);

    assert_eq!(step.attempt, 2);
    assert_eq!(step.result, Some(json!({ "n_rows": 2 })));

    let steps = tasks.list_steps_blocking(task.id);
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert!(steps[0].error.as_deref().unwrap().contains("timed out"));

    // The timeout cause reaches the retry as threaded error context.
    let threaded = steps[1].additional_input.error_info.as_deref().unwrap();
    assert!(threaded.contains("select_from_table"));
    assert!(threaded.contains("timed out"));
}

#[tokio::test]
async fn test_pre_cancelled_task_runs_no_attempts() {
    let completion = Arc::new(ScriptedCompletion::new());
    let dispatcher = Arc::new(RecordingDispatcher::new().with_spec("read_file"));
    let tasks = Arc::new(InMemoryTaskRepository::new());

    completion.push_ok(json!({ "plan": [{ "input": "never runs" }] }));

    let orchestrator = build_orchestrator(completion.clone(), dispatcher.clone(), tasks.clone());
    let task = Task::new("cancelled before the first step");
    let task_id = task.id;

    let (cancel_tx, cancel_rx) = watch::channel(true);
    let outcome = orchestrator.run_with_cancel(task, cancel_rx).await.unwrap();
    drop(cancel_tx);

    assert!(matches!(outcome, TaskOutcome::Cancelled { ordinal: 0 }));
    assert_eq!(tasks.task_status(task_id), Some(TaskStatus::Cancelled));
    assert_eq!(tasks.step_count(), 0);
    assert_eq!(completion.request_count(), 1, "only the plan request ran");
}
