//! Concurrent fan-out of one query to many agents.
//!
//! A [`Dispatcher`] takes a batch of [`AgentTask`]s, runs each one on its own tokio task and
//! reports one [`Outcome`] per agent. A task that fails, panics or times out never affects the
//! others; its result becomes an [`Outcome::Failure`] carrying both the user-facing placeholder
//! and the underlying error message.
//!
//! Results are available in two forms:
//!
//! - [`Dispatcher::dispatch`] waits for every task and returns a [`ResultSet`].
//! - [`Dispatcher::dispatch_streaming`] returns a [`DispatchStream`] yielding
//!   `(agent name, outcome)` pairs in completion order, so the fastest agent is shown first.
//!
//! Without a timeout, a task that never finishes keeps `dispatch` from returning and the stream
//! from ending. Use [`Dispatcher::with_timeout`] or [`DispatchStream::cancel`] to bound a run.
//!
//! # Example
//!
//! ```rust
//! use aiverse::dispatch::{AgentTask, Dispatcher, TaskError};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let tasks = vec![
//!     AgentTask::new("Echo", || async { Ok("hello".to_string()) }),
//!     AgentTask::new("Broken", || async { Err(TaskError::from("backend unreachable")) }),
//! ];
//!
//! let results = Dispatcher::new().dispatch(tasks).await.unwrap();
//! assert_eq!(results.len(), 2);
//! assert!(results.get("Echo").unwrap().is_success());
//! assert_eq!(results.get("Broken").unwrap().error(), Some("backend unreachable"));
//! # }
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures_util::stream::Stream;
use futures_util::{FutureExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch, Mutex};

use crate::aiverse::event::{DispatchEvent, EventHandler};

/// Shown in place of an answer when an agent fails.
pub const DEFAULT_PLACEHOLDER: &str = "Can't process the request...CHECK FOR NEXT RESPONSE ->";

/// Error text recorded for tasks stopped by [`DispatchStream::cancel`].
pub const CANCELLED_ERROR: &str = "cancelled";

/// Error type returned by agent tasks.
pub type TaskError = Box<dyn Error + Send + Sync>;

/// Future produced by an [`AgentTask`].
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<String, TaskError>> + Send>>;

type TaskFn = Box<dyn FnOnce() -> TaskFuture + Send>;

/// One unit of work: an agent name and the deferred call that produces its answer.
///
/// The closure is only called once the task is running, so anything it does (connecting a client,
/// reading configuration) is covered by the same failure isolation as the model call itself.
pub struct AgentTask {
    name: String,
    run: TaskFn,
}

impl AgentTask {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, TaskError>> + Send + 'static,
    {
        AgentTask {
            name: name.into(),
            run: Box::new(move || -> TaskFuture { Box::pin(run()) }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for AgentTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentTask").field("name", &self.name).finish()
    }
}

/// Result of one agent's task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(String),
    Failure { placeholder: String, error: String },
}

impl Outcome {
    pub fn failure(placeholder: impl Into<String>, error: impl Into<String>) -> Self {
        Outcome::Failure {
            placeholder: placeholder.into(),
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The text to show: the answer, or the placeholder for a failure.
    pub fn text(&self) -> &str {
        match self {
            Outcome::Success(text) => text,
            Outcome::Failure { placeholder, .. } => placeholder,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Outcomes keyed by agent name, iterated in the order the tasks completed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: Vec<(String, Outcome)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. A second outcome for the same name replaces the first in place.
    pub fn insert(&mut self, name: impl Into<String>, outcome: Outcome) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = outcome,
            None => self.entries.push((name, outcome)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|(_, o)| !o.is_success()).count()
    }
}

impl IntoIterator for ResultSet {
    type Item = (String, Outcome);
    type IntoIter = std::vec::IntoIter<(String, Outcome)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Rejected task batches. Nothing is spawned when one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    DuplicateAgent(String),
    EmptyAgentName,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DuplicateAgent(name) => {
                write!(f, "Agent name submitted more than once: {}", name)
            }
            DispatchError::EmptyAgentName => write!(f, "Agent name must not be empty"),
        }
    }
}

impl Error for DispatchError {}

/// Runs agent tasks concurrently and collects one outcome per agent.
///
/// A `Dispatcher` holds only settings, so one instance may serve any number of dispatches; each
/// call spawns exactly one tokio task per submitted agent and shares nothing with other calls.
#[derive(Clone)]
pub struct Dispatcher {
    placeholder: String,
    timeout: Option<Duration>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            timeout: None,
            event_handler: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Fail any task still running after `limit` with a "timed out after ..." error.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run every task concurrently and wait for all of them.
    pub async fn dispatch(&self, tasks: Vec<AgentTask>) -> Result<ResultSet, DispatchError> {
        let mut stream = self.dispatch_streaming(tasks).await?;
        let mut results = ResultSet::new();
        while let Some((name, outcome)) = stream.next().await {
            results.insert(name, outcome);
        }
        Ok(results)
    }

    /// Run every task concurrently and yield each outcome as soon as it is known.
    ///
    /// The stream yields exactly one item per task, in completion order, then ends.
    pub async fn dispatch_streaming(
        &self,
        tasks: Vec<AgentTask>,
    ) -> Result<DispatchStream, DispatchError> {
        validate(&tasks)?;
        let run = Arc::new(DispatchRun::new(tasks.len(), self.event_handler.clone()));
        run.start().await;

        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel_tx, _) = watch::channel(false);

        for task in tasks {
            let tx = tx.clone();
            let run = Arc::clone(&run);
            let mut cancel_rx = cancel_tx.subscribe();
            let placeholder = self.placeholder.clone();
            let timeout = self.timeout;

            tokio::spawn(async move {
                let AgentTask { name, run: task_fn } = task;
                let outcome = tokio::select! {
                    outcome = run_task(task_fn, timeout, &placeholder) => outcome,
                    _ = cancelled(&mut cancel_rx) => Outcome::failure(&placeholder, CANCELLED_ERROR),
                };
                let succeeded = outcome.is_success();
                run.record(&name, succeeded, || {
                    // The receiver is gone only if the caller dropped the stream.
                    let _ = tx.send((name.clone(), outcome));
                })
                .await;
            });
        }

        Ok(DispatchStream {
            dispatch_id: run.dispatch_id.clone(),
            remaining: run.total,
            rx,
            cancel_tx,
        })
    }

    /// Run the tasks one at a time in submission order, with the same per-task isolation.
    pub async fn dispatch_sequential(
        &self,
        tasks: Vec<AgentTask>,
    ) -> Result<ResultSet, DispatchError> {
        validate(&tasks)?;
        let run = DispatchRun::new(tasks.len(), self.event_handler.clone());
        run.start().await;

        let mut results = ResultSet::new();
        for task in tasks {
            let AgentTask { name, run: task_fn } = task;
            let outcome = run_task(task_fn, self.timeout, &self.placeholder).await;
            let succeeded = outcome.is_success();
            run.record(&name, succeeded, || results.insert(name.clone(), outcome))
                .await;
        }
        Ok(results)
    }
}

fn validate(tasks: &[AgentTask]) -> Result<(), DispatchError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if task.name.trim().is_empty() {
            return Err(DispatchError::EmptyAgentName);
        }
        if !seen.insert(task.name.as_str()) {
            return Err(DispatchError::DuplicateAgent(task.name.clone()));
        }
    }
    Ok(())
}

struct Progress {
    completed: usize,
    failures: usize,
}

/// State shared by the tasks of a single dispatch.
struct DispatchRun {
    dispatch_id: String,
    total: usize,
    started: Instant,
    handler: Option<Arc<dyn EventHandler>>,
    progress: Mutex<Progress>,
}

impl DispatchRun {
    fn new(total: usize, handler: Option<Arc<dyn EventHandler>>) -> Self {
        DispatchRun {
            dispatch_id: uuid::Uuid::new_v4().to_string(),
            total,
            started: Instant::now(),
            handler,
            progress: Mutex::new(Progress {
                completed: 0,
                failures: 0,
            }),
        }
    }

    /// Call the handler, if any. A panicking handler is logged and otherwise ignored so the
    /// outcome it was reporting is still delivered.
    async fn emit(&self, event: DispatchEvent) {
        if let Some(handler) = &self.handler {
            let notified = AssertUnwindSafe(handler.on_dispatch_event(&event))
                .catch_unwind()
                .await;
            if let Err(panic) = notified {
                warn!(
                    "Dispatch {}: event handler panicked: {}",
                    self.dispatch_id,
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    async fn start(&self) {
        debug!("Dispatch {} started with {} task(s)", self.dispatch_id, self.total);
        self.emit(DispatchEvent::DispatchStarted {
            dispatch_id: self.dispatch_id.clone(),
            total: self.total,
        })
        .await;
        if self.total == 0 {
            self.finish(0).await;
        }
    }

    async fn finish(&self, failures: usize) {
        let elapsed = self.started.elapsed();
        info!(
            "Dispatch {} finished: {} task(s), {} failure(s) in {:?}",
            self.dispatch_id, self.total, failures, elapsed
        );
        self.emit(DispatchEvent::DispatchCompleted {
            dispatch_id: self.dispatch_id.clone(),
            total: self.total,
            failures,
            elapsed,
        })
        .await;
    }

    /// Count one completion, emit its events, then publish it through `deliver`.
    ///
    /// Everything happens under the progress lock, so delivery order, `completed` numbers and
    /// event order all agree. A consumer that has received the last outcome has also seen the
    /// last event.
    async fn record<F: FnOnce()>(&self, agent_name: &str, succeeded: bool, deliver: F) {
        let mut progress = self.progress.lock().await;
        progress.completed += 1;
        if !succeeded {
            progress.failures += 1;
        }

        self.emit(DispatchEvent::TaskCompleted {
            dispatch_id: self.dispatch_id.clone(),
            agent_name: agent_name.to_string(),
            succeeded,
            completed: progress.completed,
            total: self.total,
            elapsed: self.started.elapsed(),
        })
        .await;

        if progress.completed == self.total {
            self.finish(progress.failures).await;
        }
        deliver();
    }
}

/// Run one task to an [`Outcome`]. Errors, panics and timeouts all become failures.
async fn run_task(task_fn: TaskFn, timeout: Option<Duration>, placeholder: &str) -> Outcome {
    let started = Instant::now();
    let guarded = AssertUnwindSafe(async move { task_fn().await }).catch_unwind();

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(result) => result,
            Err(_) => return Outcome::failure(placeholder, format!("timed out after {:?}", limit)),
        },
        None => guarded.await,
    };

    match result {
        Ok(Ok(text)) => {
            debug!("Task completed in {:?}", started.elapsed());
            Outcome::Success(text)
        }
        Ok(Err(err)) => {
            warn!("Task failed after {:?}: {}", started.elapsed(), err);
            Outcome::failure(placeholder, err.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("Task panicked: {}", message);
            Outcome::failure(placeholder, format!("task panicked: {}", message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Resolves once cancellation is requested. If the stream (and with it the sender) is dropped
/// without cancelling, it never resolves.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Completion-ordered outcomes of a running dispatch.
///
/// Yields exactly one `(agent name, outcome)` pair per submitted task and then ends. Dropping the
/// stream does not stop the tasks; call [`cancel`](Self::cancel) for that.
pub struct DispatchStream {
    dispatch_id: String,
    remaining: usize,
    rx: mpsc::UnboundedReceiver<(String, Outcome)>,
    cancel_tx: watch::Sender<bool>,
}

impl DispatchStream {
    pub fn dispatch_id(&self) -> &str {
        &self.dispatch_id
    }

    /// Number of outcomes not yet yielded.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Stop every task that is still running. Each one is still yielded, as a failure with the
    /// error `"cancelled"`.
    pub fn cancel(&self) {
        if self.remaining > 0 {
            info!("Dispatch {} cancelled", self.dispatch_id);
        }
        self.cancel_tx.send_replace(true);
    }
}

impl Stream for DispatchStream {
    type Item = (String, Outcome);

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(item)) => {
                self.remaining -= 1;
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                // Every task sends before finishing, so this means the runtime dropped tasks.
                self.remaining = 0;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl fmt::Debug for DispatchStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchStream")
            .field("dispatch_id", &self.dispatch_id)
            .field("remaining", &self.remaining)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = Outcome::Success("4".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.text(), "4");
        assert_eq!(ok.error(), None);

        let failed = Outcome::failure(DEFAULT_PLACEHOLDER, "HTTP 401");
        assert!(!failed.is_success());
        assert_eq!(failed.text(), DEFAULT_PLACEHOLDER);
        assert_eq!(failed.error(), Some("HTTP 401"));
    }

    #[test]
    fn test_result_set_keeps_insertion_order() {
        let mut set = ResultSet::new();
        set.insert("Y", Outcome::Success("y".into()));
        set.insert("Z", Outcome::failure("p", "e"));
        set.insert("X", Outcome::Success("x".into()));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["Y", "Z", "X"]);
        assert_eq!(set.failures(), 1);

        set.insert("Z", Outcome::Success("z".into()));
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("Z").unwrap().text(), "z");
        assert!(!set.contains("W"));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let dup = vec![
            AgentTask::new("A", || async { Ok(String::new()) }),
            AgentTask::new("A", || async { Ok(String::new()) }),
        ];
        assert_eq!(validate(&dup), Err(DispatchError::DuplicateAgent("A".into())));

        let empty = vec![AgentTask::new("  ", || async { Ok(String::new()) })];
        assert_eq!(validate(&empty), Err(DispatchError::EmptyAgentName));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
