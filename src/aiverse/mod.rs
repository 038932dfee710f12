// aiverse/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod dispatch;
pub mod event;
pub mod http_client_pool;
pub mod report;
pub mod roster;
pub mod tool_protocol;
pub mod tool_protocols;
pub mod tools;

pub use agent::{Agent, InvocationError};
pub use dispatch::{AgentTask, DispatchError, DispatchStream, Dispatcher, Outcome, ResultSet};
