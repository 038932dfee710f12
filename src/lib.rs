//! # AIVerse
//!
//! AIVerse asks one question to several LLM agents at once and collects every answer.
//!
//! The crate is organised in layers:
//!
//! * **Dispatch**: [`Dispatcher`] runs one [`AgentTask`] per agent concurrently and turns each
//!   result into an [`Outcome`]. A failing, panicking or slow agent never takes the others down.
//!   Results come back all at once as a [`ResultSet`] or one by one, in completion order,
//!   through a [`DispatchStream`].
//! * **Agents**: [`Agent`] sends a query to one model, runs the tool calls the model asks for and
//!   returns the final text.
//! * **Clients**: [`ClientWrapper`] implementations for Ollama, Groq, Google and OpenAI, all over
//!   the OpenAI-compatible Chat Completions protocol. [`clients::connect`] resolves
//!   `provider:model` identifiers.
//! * **Tools**: weather, USD to INR conversion, web search and a calculator, registered in a
//!   [`tool_protocol::ToolRegistry`] by [`tools::builtin_registry`].
//! * **Roster and report**: the default six-agent line-up ([`roster::default_roster`]) and text or
//!   markdown rendering of the results ([`report`]).
//!
//! ## Fan-out
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aiverse::config::AiverseConfig;
//! use aiverse::roster::{build_tasks, default_roster};
//! use aiverse::tools::builtin_registry;
//! use aiverse::Dispatcher;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     aiverse::init_logger();
//!     let config = AiverseConfig::from_env();
//!     let tools = builtin_registry(&config).await?;
//!     let tasks = build_tasks(&default_roster(), "What is 2 + 2?", &config, Some(tools));
//!
//!     let mut stream = Dispatcher::new().dispatch_streaming(tasks).await?;
//!     while let Some((name, outcome)) = stream.next().await {
//!         println!("\n{} Agent Response:\n{}", name, outcome.text());
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Filtering follows `RUST_LOG`; calling it again is a no-op.
///
/// ```rust
/// aiverse::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `aiverse` module.
pub mod aiverse;

// Re-exporting key items for easier external access.
pub use aiverse::agent;
pub use aiverse::agent::{Agent, InvocationError};
pub use aiverse::client_wrapper;
pub use aiverse::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
pub use aiverse::clients;
pub use aiverse::config;
pub use aiverse::config::AiverseConfig;
pub use aiverse::dispatch;
pub use aiverse::dispatch::{
    AgentTask, DispatchError, DispatchStream, Dispatcher, Outcome, ResultSet,
};
pub use aiverse::event;
pub use aiverse::event::{DispatchEvent, EventHandler};
pub use aiverse::http_client_pool;
pub use aiverse::report;
pub use aiverse::roster;
pub use aiverse::roster::AgentSpec;
pub use aiverse::tool_protocol;
pub use aiverse::tool_protocols;
pub use aiverse::tools;
