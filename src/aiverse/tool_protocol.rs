//! Tool protocol abstraction layer.
//!
//! Tools are the external callables an [`Agent`](crate::Agent) offers to its model. Every tool
//! is reached through a [`ToolProtocol`] implementation and grouped in a [`ToolRegistry`], which
//! is what an agent carries around.
//!
//! ```text
//! Agent → ToolRegistry → ToolProtocol (trait) → [CustomToolProtocol | user-defined]
//! ```
//!
//! # Example
//!
//! ```rust
//! use aiverse::tool_protocol::{ToolParameter, ToolParameterType};
//!
//! let param = ToolParameter::new("location", ToolParameterType::String)
//!     .with_description("City name, e.g. Mumbai")
//!     .required();
//! assert!(param.required);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Represents the result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful
    pub success: bool,
    /// The output data from the tool
    pub output: serde_json::Value,
    /// Optional error message if execution failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Convenience constructor for successful tool execution.
    pub fn success(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    /// Convenience constructor for failed tool execution.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error),
        }
    }

    /// Text rendering of the output handed back to the model.
    ///
    /// Plain strings are returned verbatim; anything else is pretty printed JSON.
    pub fn output_text(&self) -> String {
        match &self.output {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

/// Defines the type of a tool parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Defines a parameter for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParameter {
    /// Define a new tool parameter with the provided name and type.
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }

    /// Add a human readable description that will surface in the tool catalogue.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Metadata about a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// Create metadata with the supplied identifier and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter definition to the tool metadata.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Trait for implementing tool execution protocols
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    /// Execute a tool with the given parameters
    async fn execute(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    /// Get metadata about available tools
    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>>;

    /// Get metadata about a specific tool
    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>>;

    /// Protocol identifier (e.g., "custom")
    fn protocol_name(&self) -> &str;
}

/// Error types for tool operations
#[derive(Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Requested tool is not registered in the current registry/protocol.
    NotFound(String),
    /// The tool's external call failed or returned malformed data.
    ExecutionFailed(String),
    /// The provided JSON parameters failed validation or deserialization.
    InvalidParameters(String),
    /// A lower level protocol/transport error occurred.
    ProtocolError(String),
    /// The tool needs a credential that is not configured (holds the variable name).
    MissingCredential(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool not found: {}", name),
            ToolError::ExecutionFailed(msg) => write!(f, "Tool execution failed: {}", msg),
            ToolError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            ToolError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            ToolError::MissingCredential(var) => write!(f, "Missing credential: {} is not set", var),
        }
    }
}

impl Error for ToolError {}

/// A tool that can be used by agents
pub struct Tool {
    metadata: ToolMetadata,
    protocol: Arc<dyn ToolProtocol>,
}

impl Tool {
    /// Bind metadata to the protocol that executes it.
    pub fn new(metadata: ToolMetadata, protocol: Arc<dyn ToolProtocol>) -> Self {
        Self { metadata, protocol }
    }

    /// Borrow the static metadata for the tool.
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Execute the tool using the configured protocol.
    pub async fn execute(
        &self,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        self.protocol.execute(&self.metadata.name, parameters).await
    }
}

/// Registry for managing the tools offered to agents.
///
/// A registry is immutable once shared: agents hold it behind an `Arc` and only read from it,
/// so concurrently running agents can use the same registry without locking.
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
    protocol: Arc<dyn ToolProtocol>,
}

impl ToolRegistry {
    /// Build an empty registry powered by the provided protocol implementation.
    pub fn new(protocol: Arc<dyn ToolProtocol>) -> Self {
        Self {
            tools: HashMap::new(),
            protocol,
        }
    }

    /// Import every tool the protocol advertises. Returns how many tools were added.
    pub async fn discover_tools(&mut self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let listed = self.protocol.list_tools().await?;
        let count = listed.len();
        for metadata in listed {
            let tool = Tool::new(metadata, self.protocol.clone());
            self.add_tool(tool);
        }
        log::debug!(
            "ToolRegistry::discover_tools(): {} tool(s) from protocol '{}'",
            count,
            self.protocol.protocol_name()
        );
        Ok(count)
    }

    /// Insert or replace a tool definition.
    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.insert(tool.metadata.name.clone(), tool);
    }

    /// Borrow a tool by name.
    pub fn get_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// List metadata for registered tools, sorted by name so prompts are stable.
    pub fn list_tools(&self) -> Vec<&ToolMetadata> {
        let mut tools: Vec<&ToolMetadata> = self.tools.values().map(|t| &t.metadata).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a named tool with serialized parameters.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        tool.execute(parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProtocol;

    #[async_trait]
    impl ToolProtocol for MockProtocol {
        async fn execute(
            &self,
            tool_name: &str,
            _parameters: serde_json::Value,
        ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
            Ok(ToolResult::success(serde_json::json!({
                "tool": tool_name,
                "result": "mock_result"
            })))
        }

        async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
            Ok(vec![
                ToolMetadata::new("weather", "Looks up weather"),
                ToolMetadata::new("calculator", "Evaluates arithmetic"),
            ])
        }

        async fn get_tool_metadata(
            &self,
            tool_name: &str,
        ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
            Ok(ToolMetadata::new(tool_name, "A mock tool"))
        }

        fn protocol_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_tool_parameter_builder() {
        let param = ToolParameter::new("amount", ToolParameterType::Number)
            .with_description("Amount in USD")
            .required();

        assert_eq!(param.name, "amount");
        assert_eq!(param.param_type, ToolParameterType::Number);
        assert_eq!(param.description, Some("Amount in USD".to_string()));
        assert!(param.required);
    }

    #[test]
    fn test_output_text_prefers_plain_strings() {
        let text = ToolResult::success(serde_json::json!("sunny"));
        assert_eq!(text.output_text(), "sunny");

        let json = ToolResult::success(serde_json::json!({"a": 1}));
        assert!(json.output_text().contains("\"a\": 1"));
    }

    #[tokio::test]
    async fn test_discover_and_execute() {
        let mut registry = ToolRegistry::new(Arc::new(MockProtocol));
        assert!(registry.is_empty());

        let added = registry.discover_tools().await.unwrap();
        assert_eq!(added, 2);

        let names: Vec<&str> = registry.list_tools().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["calculator", "weather"]);

        let result = registry
            .execute_tool("weather", serde_json::json!({}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output["tool"], "weather");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new(Arc::new(MockProtocol));
        let err = registry
            .execute_tool("missing", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: missing");
    }
}
