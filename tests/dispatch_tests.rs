use aiverse::dispatch::{
    AgentTask, DispatchError, Dispatcher, Outcome, TaskError, CANCELLED_ERROR,
    DEFAULT_PLACEHOLDER,
};
use aiverse::event::{DispatchEvent, EventHandler};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn answer_after(name: &str, delay_ms: u64, text: &str) -> AgentTask {
    let text = text.to_string();
    AgentTask::new(name, move || async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(text)
    })
}

fn fail_after(name: &str, delay_ms: u64, error: &str) -> AgentTask {
    let error = error.to_string();
    AgentTask::new(name, move || async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Err(TaskError::from(error))
    })
}

fn never_finishes(name: &str) -> AgentTask {
    AgentTask::new(name, || async {
        std::future::pending::<()>().await;
        Ok(String::new())
    })
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingHandler {
    fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_dispatch_event(&self, event: &DispatchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn three_staggered_agents() -> Vec<AgentTask> {
    vec![
        answer_after("X", 150, "a"),
        answer_after("Y", 50, "b"),
        answer_after("Z", 100, "c"),
    ]
}

#[tokio::test]
async fn test_streaming_yields_in_completion_order() {
    let stream = Dispatcher::new()
        .dispatch_streaming(three_staggered_agents())
        .await
        .unwrap();
    let items: Vec<(String, Outcome)> = stream.collect().await;

    assert_eq!(
        items,
        vec![
            ("Y".to_string(), Outcome::Success("b".to_string())),
            ("Z".to_string(), Outcome::Success("c".to_string())),
            ("X".to_string(), Outcome::Success("a".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_bulk_dispatch_collects_every_answer() {
    let results = Dispatcher::new()
        .dispatch(three_staggered_agents())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results.get("X"), Some(&Outcome::Success("a".to_string())));
    assert_eq!(results.get("Y"), Some(&Outcome::Success("b".to_string())));
    assert_eq!(results.get("Z"), Some(&Outcome::Success("c".to_string())));
    assert_eq!(results.names().collect::<Vec<_>>(), vec!["Y", "Z", "X"]);
}

#[tokio::test]
async fn test_bulk_result_has_every_submitted_agent() {
    let tasks = vec![
        answer_after("DeepSeek", 30, "a"),
        fail_after("OpenAI", 10, "HTTP 500"),
        answer_after("Qwen", 0, "c"),
        answer_after("Llama", 20, "d"),
    ];

    let results = Dispatcher::new().dispatch(tasks).await.unwrap();

    let mut names: Vec<&str> = results.names().collect();
    names.sort();
    assert_eq!(names, vec!["DeepSeek", "Llama", "OpenAI", "Qwen"]);
    assert_eq!(results.failures(), 1);
}

#[tokio::test]
async fn test_single_failure_is_isolated() {
    let tasks = vec![
        answer_after("A", 10, "alpha"),
        fail_after("B", 5, "HTTP 401 Unauthorized"),
        answer_after("C", 20, "gamma"),
    ];

    let results = Dispatcher::new().dispatch(tasks).await.unwrap();

    assert_eq!(results.get("A"), Some(&Outcome::Success("alpha".to_string())));
    assert_eq!(results.get("C"), Some(&Outcome::Success("gamma".to_string())));
    match results.get("B").unwrap() {
        Outcome::Failure { placeholder, error } => {
            assert_eq!(placeholder, DEFAULT_PLACEHOLDER);
            assert!(error.contains("401"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_every_agent_failing_still_returns() {
    let tasks = vec![fail_after("A", 0, "down"), fail_after("B", 0, "down")];
    let results = Dispatcher::new().dispatch(tasks).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.failures(), 2);
}

#[tokio::test]
async fn test_panicking_task_becomes_failure() {
    let tasks = vec![
        AgentTask::new("Panics", || async {
            if true {
                panic!("model client exploded");
            }
            Ok(String::new())
        }),
        answer_after("Fine", 20, "ok"),
    ];

    let results = Dispatcher::new().dispatch(tasks).await.unwrap();

    assert!(results.get("Fine").unwrap().is_success());
    let error = results.get("Panics").unwrap().error().unwrap();
    assert!(error.contains("model client exploded"));
}

#[tokio::test]
async fn test_empty_task_set_returns_immediately() {
    let started = Instant::now();
    let results = Dispatcher::new().dispatch(Vec::new()).await.unwrap();
    assert!(results.is_empty());
    assert!(started.elapsed() < Duration::from_millis(100));

    let mut stream = Dispatcher::new().dispatch_streaming(Vec::new()).await.unwrap();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_hanging_task_blocks_dispatch_without_timeout() {
    let others_done = Arc::new(AtomicUsize::new(0));
    let mut tasks = vec![never_finishes("Stuck")];
    for name in ["A", "B"] {
        let others_done = Arc::clone(&others_done);
        tasks.push(AgentTask::new(name, move || async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            others_done.fetch_add(1, Ordering::SeqCst);
            Ok("done".to_string())
        }));
    }

    let outer = tokio::time::timeout(
        Duration::from_millis(300),
        Dispatcher::new().dispatch(tasks),
    )
    .await;

    assert!(outer.is_err(), "dispatch must not return while a task hangs");
    assert_eq!(others_done.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stream_delivers_finished_tasks_while_one_hangs() {
    let tasks = vec![never_finishes("Stuck"), answer_after("Quick", 10, "fast")];
    let mut stream = Dispatcher::new().dispatch_streaming(tasks).await.unwrap();

    let (name, outcome) = stream.next().await.unwrap();
    assert_eq!(name, "Quick");
    assert!(outcome.is_success());

    let next = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
    assert!(next.is_err(), "stream must not end while a task hangs");
    assert_eq!(stream.remaining(), 1);
}

#[tokio::test]
async fn test_timeout_turns_hang_into_failure() {
    let tasks = vec![never_finishes("Stuck"), answer_after("Quick", 5, "fast")];

    let results = Dispatcher::new()
        .with_timeout(Duration::from_millis(50))
        .dispatch(tasks)
        .await
        .unwrap();

    assert!(results.get("Quick").unwrap().is_success());
    let stuck = results.get("Stuck").unwrap();
    assert_eq!(stuck.text(), DEFAULT_PLACEHOLDER);
    assert!(stuck.error().unwrap().starts_with("timed out after"));
}

#[tokio::test]
async fn test_cancel_yields_remaining_tasks_as_cancelled() {
    let tasks = vec![
        never_finishes("Stuck"),
        never_finishes("AlsoStuck"),
        answer_after("Quick", 5, "fast"),
    ];
    let mut stream = Dispatcher::new().dispatch_streaming(tasks).await.unwrap();

    let (first, _) = stream.next().await.unwrap();
    assert_eq!(first, "Quick");

    stream.cancel();
    let rest: Vec<(String, Outcome)> =
        tokio::time::timeout(Duration::from_secs(1), stream.collect())
            .await
            .expect("cancelled tasks must be delivered promptly");

    assert_eq!(rest.len(), 2);
    for (_, outcome) in &rest {
        assert_eq!(outcome.error(), Some(CANCELLED_ERROR));
    }
}

#[tokio::test]
async fn test_dropping_stream_does_not_abort_tasks() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let tasks = vec![AgentTask::new("Slow", move || async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        flag.store(true, Ordering::SeqCst);
        Ok("done".to_string())
    })];

    let stream = Dispatcher::new().dispatch_streaming(tasks).await.unwrap();
    drop(stream);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_invalid_names_rejected_before_running() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let tasks = vec![
        AgentTask::new("Same", move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok(String::new())
        }),
        answer_after("Same", 0, "x"),
    ];

    let err = Dispatcher::new().dispatch(tasks).await.unwrap_err();
    assert_eq!(err, DispatchError::DuplicateAgent("Same".to_string()));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!ran.load(Ordering::SeqCst));

    let err = Dispatcher::new()
        .dispatch_streaming(vec![answer_after("", 0, "x")])
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::EmptyAgentName);
}

#[tokio::test]
async fn test_repeated_dispatch_gives_same_results() {
    let build = || {
        vec![
            answer_after("A", 20, "alpha"),
            fail_after("B", 10, "quota exceeded"),
            answer_after("C", 0, "gamma"),
        ]
    };
    let dispatcher = Dispatcher::new();

    let first = dispatcher.dispatch(build()).await.unwrap();
    let second = dispatcher.dispatch(build()).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (name, outcome) in first.iter() {
        assert_eq!(second.get(name), Some(outcome));
    }
}

#[tokio::test]
async fn test_tasks_run_concurrently() {
    let tasks: Vec<AgentTask> = (0..5)
        .map(|i| answer_after(&format!("Agent{}", i), 200, "done"))
        .collect();

    let started = Instant::now();
    let results = Dispatcher::new().dispatch(tasks).await.unwrap();

    assert_eq!(results.len(), 5);
    assert!(started.elapsed() < Duration::from_millis(600));
}

#[tokio::test]
async fn test_custom_placeholder() {
    let results = Dispatcher::new()
        .with_placeholder("unavailable")
        .dispatch(vec![fail_after("A", 0, "boom")])
        .await
        .unwrap();
    assert_eq!(
        results.get("A"),
        Some(&Outcome::failure("unavailable", "boom"))
    );
}

#[tokio::test]
async fn test_sequential_runs_in_submission_order() {
    let tasks = vec![
        answer_after("Slow", 40, "s"),
        fail_after("Broken", 0, "nope"),
        answer_after("Fast", 0, "f"),
    ];

    let results = Dispatcher::new().dispatch_sequential(tasks).await.unwrap();

    let names: Vec<&str> = results.names().collect();
    assert_eq!(names, vec!["Slow", "Broken", "Fast"]);
    assert_eq!(results.get("Broken").unwrap().error(), Some("nope"));
}

#[tokio::test]
async fn test_progress_events() {
    let handler = Arc::new(RecordingHandler::default());
    let tasks = vec![
        answer_after("A", 30, "a"),
        fail_after("B", 0, "err"),
        answer_after("C", 15, "c"),
    ];

    let results = Dispatcher::new()
        .with_event_handler(handler.clone())
        .dispatch(tasks)
        .await
        .unwrap();
    assert_eq!(results.len(), 3);

    let events = handler.events();
    assert_eq!(events.len(), 5);
    let dispatch_id = events[0].dispatch_id().to_string();
    assert!(events.iter().all(|e| e.dispatch_id() == dispatch_id));

    assert!(matches!(events[0], DispatchEvent::DispatchStarted { total: 3, .. }));

    let completions: Vec<(String, bool, usize)> = events[1..4]
        .iter()
        .map(|e| match e {
            DispatchEvent::TaskCompleted {
                agent_name,
                succeeded,
                completed,
                total,
                ..
            } => {
                assert_eq!(*total, 3);
                (agent_name.clone(), *succeeded, *completed)
            }
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(
        completions.iter().map(|c| c.2).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    // Completion numbering follows the same order as the result set.
    assert_eq!(
        completions.iter().map(|c| c.0.as_str()).collect::<Vec<_>>(),
        results.names().collect::<Vec<_>>()
    );
    assert!(completions.iter().any(|c| c.0 == "B" && !c.1));

    assert!(matches!(
        events[4],
        DispatchEvent::DispatchCompleted {
            total: 3,
            failures: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_empty_dispatch_events() {
    let handler = Arc::new(RecordingHandler::default());
    Dispatcher::new()
        .with_event_handler(handler.clone())
        .dispatch(Vec::new())
        .await
        .unwrap();

    let events = handler.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], DispatchEvent::DispatchStarted { total: 0, .. }));
    assert!(matches!(
        events[1],
        DispatchEvent::DispatchCompleted {
            total: 0,
            failures: 0,
            ..
        }
    ));
}

/// Panics while being told about agent "B".
struct PanickingHandler;

#[async_trait]
impl EventHandler for PanickingHandler {
    async fn on_dispatch_event(&self, event: &DispatchEvent) {
        if let DispatchEvent::TaskCompleted { agent_name, .. } = event {
            if agent_name == "B" {
                panic!("progress bar crashed");
            }
        }
    }
}

#[tokio::test]
async fn test_panicking_event_handler_does_not_drop_outcomes() {
    let tasks = vec![answer_after("A", 0, "a"), answer_after("B", 20, "b")];

    let results = tokio::time::timeout(
        Duration::from_secs(1),
        Dispatcher::new()
            .with_event_handler(Arc::new(PanickingHandler))
            .dispatch(tasks),
    )
    .await
    .expect("dispatch must finish")
    .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results.get("B"), Some(&Outcome::Success("b".to_string())));

    let sequential = Dispatcher::new()
        .with_event_handler(Arc::new(PanickingHandler))
        .dispatch_sequential(vec![answer_after("A", 0, "a"), answer_after("B", 0, "b")])
        .await
        .unwrap();
    assert_eq!(sequential.len(), 2);
}
