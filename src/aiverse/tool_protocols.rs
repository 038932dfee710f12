//! Tool protocol implementations.
//!
//! [`CustomToolProtocol`] exposes plain Rust closures (sync or async) as tools. The built-in
//! weather, currency, search and calculator tools are all registered through it, see
//! [`tools::builtin_registry`](crate::tools::builtin_registry).

use crate::aiverse::tool_protocol::{ToolError, ToolMetadata, ToolProtocol, ToolResult};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What every tool function produces.
pub type ToolOutput = Result<ToolResult, Box<dyn Error + Send + Sync>>;

/// Type alias for synchronous tool functions exposed via the custom adapter.
pub type ToolFunction = Arc<dyn Fn(JsonValue) -> ToolOutput + Send + Sync>;

/// Future returned by asynchronous tool functions.
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolOutput> + Send>>;

/// Type alias for asynchronous tool functions exposed via the custom adapter.
pub type AsyncToolFunction = Arc<dyn Fn(JsonValue) -> ToolFuture + Send + Sync>;

/// Custom function-calling tool adapter
///
/// # Example
///
/// ```rust
/// use aiverse::tool_protocols::{CustomToolProtocol, ToolOutput};
/// use aiverse::tool_protocol::{ToolMetadata, ToolParameter, ToolParameterType, ToolResult};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let adapter = CustomToolProtocol::new();
/// adapter
///     .register_tool(
///         ToolMetadata::new("add", "Adds two numbers")
///             .with_parameter(ToolParameter::new("a", ToolParameterType::Number).required())
///             .with_parameter(ToolParameter::new("b", ToolParameterType::Number).required()),
///         Arc::new(|params: serde_json::Value| -> ToolOutput {
///             let a = params["a"].as_f64().unwrap_or(0.0);
///             let b = params["b"].as_f64().unwrap_or(0.0);
///             Ok(ToolResult::success(serde_json::json!(a + b)))
///         }),
///     )
///     .await;
/// # }
/// ```
pub struct CustomToolProtocol {
    tools: RwLock<HashMap<String, ToolMetadata>>,
    sync_functions: RwLock<HashMap<String, ToolFunction>>,
    async_functions: RwLock<HashMap<String, AsyncToolFunction>>,
}

impl CustomToolProtocol {
    /// Create an empty adapter ready to accept new tool registrations.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            sync_functions: RwLock::new(HashMap::new()),
            async_functions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a synchronous tool function.
    ///
    /// Subsequent calls will overwrite any existing tool with the same name.
    pub async fn register_tool(&self, metadata: ToolMetadata, function: ToolFunction) {
        let name = metadata.name.clone();
        self.async_functions.write().await.remove(&name);
        self.tools.write().await.insert(name.clone(), metadata);
        self.sync_functions.write().await.insert(name, function);
    }

    /// Register an asynchronous tool function.
    pub async fn register_async_tool(&self, metadata: ToolMetadata, function: AsyncToolFunction) {
        let name = metadata.name.clone();
        self.sync_functions.write().await.remove(&name);
        self.tools.write().await.insert(name.clone(), metadata);
        self.async_functions.write().await.insert(name, function);
    }
}

impl Default for CustomToolProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProtocol for CustomToolProtocol {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        // The read guard is released before awaiting the tool so slow tools never hold it.
        let async_func = self.async_functions.read().await.get(tool_name).cloned();
        if let Some(func) = async_func {
            return func(parameters).await;
        }

        let sync_func = self.sync_functions.read().await.get(tool_name).cloned();
        if let Some(func) = sync_func {
            return func(parameters);
        }

        Err(Box::new(ToolError::NotFound(tool_name.to_string())))
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        let tools = self.tools.read().await;
        Ok(tools.values().cloned().collect())
    }

    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
        let tools = self.tools.read().await;
        tools.get(tool_name).cloned().ok_or_else(|| {
            Box::new(ToolError::NotFound(tool_name.to_string())) as Box<dyn Error + Send + Sync>
        })
    }

    fn protocol_name(&self) -> &str {
        "custom"
    }
}
