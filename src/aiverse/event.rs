//! Dispatch progress events.
//!
//! Implement [`EventHandler`] and register it with
//! [`Dispatcher::with_event_handler`](crate::dispatch::Dispatcher::with_event_handler) to observe
//! a fan-out as it happens. The handler is shared by every task of a dispatch and called from
//! whichever task just finished, so implementations must be cheap and thread-safe.
//!
//! Within one dispatch the events arrive in this order:
//!
//! 1. [`DispatchStarted`](DispatchEvent::DispatchStarted), once
//! 2. [`TaskCompleted`](DispatchEvent::TaskCompleted), once per task, with `completed` counting
//!    up from 1 to `total`
//! 3. [`DispatchCompleted`](DispatchEvent::DispatchCompleted), once, after the last task
//!
//! # Example
//!
//! ```rust
//! use aiverse::event::{progress_percent, DispatchEvent, EventHandler};
//! use async_trait::async_trait;
//!
//! struct ProgressBar;
//!
//! #[async_trait]
//! impl EventHandler for ProgressBar {
//!     async fn on_dispatch_event(&self, event: &DispatchEvent) {
//!         if let DispatchEvent::TaskCompleted { agent_name, completed, total, .. } = event {
//!             println!("{}% ({} done)", progress_percent(*completed, *total), agent_name);
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;

/// Progress notifications emitted by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    DispatchStarted {
        dispatch_id: String,
        total: usize,
    },
    TaskCompleted {
        dispatch_id: String,
        agent_name: String,
        succeeded: bool,
        /// Number of tasks finished so far, this one included.
        completed: usize,
        total: usize,
        /// Time since the dispatch started.
        elapsed: Duration,
    },
    DispatchCompleted {
        dispatch_id: String,
        total: usize,
        failures: usize,
        elapsed: Duration,
    },
}

impl DispatchEvent {
    pub fn dispatch_id(&self) -> &str {
        match self {
            DispatchEvent::DispatchStarted { dispatch_id, .. }
            | DispatchEvent::TaskCompleted { dispatch_id, .. }
            | DispatchEvent::DispatchCompleted { dispatch_id, .. } => dispatch_id,
        }
    }
}

/// Callback trait for dispatch progress. The default implementation ignores everything.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_dispatch_event(&self, _event: &DispatchEvent) {}
}

/// Progress bar position for `completed` out of `total` tasks.
///
/// The first 20% is reserved for setup, the last 10% for rendering, and the fan-out itself
/// moves the bar from 20 to 90.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 90;
    }
    let completed = completed.min(total);
    (20 + completed * 70 / total) as u8
}
