//! The agent invoker: one model, one query, one text answer.
//!
//! An [`Agent`] binds a display name to a [`ClientWrapper`] and, optionally, a shared
//! [`ToolRegistry`]. [`Agent::invoke`] runs a single question through the model, letting it call
//! tools along the way, and returns the model's final text.
//!
//! Tools are offered through the prompt rather than a vendor-specific function calling API, so the
//! same loop works against every OpenAI-compatible backend:
//!
//! ```text
//! {"tool_call": {"name": "calculator", "parameters": {"expression": "2 + 2"}}}
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aiverse::Agent;
//! use aiverse::clients::groq::{GroqClient, Model};
//! use aiverse::config::AiverseConfig;
//! use aiverse::tools::builtin_registry;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = AiverseConfig::from_env();
//! let client = GroqClient::new_with_model_enum(
//!     config.groq_api_key.as_deref().unwrap_or_default(),
//!     Model::Llama33_70BVersatile,
//! );
//! let agent = Agent::new("Llama", Arc::new(client)).with_tools(builtin_registry(&config).await?);
//! println!("{}", agent.invoke("What is 17 * 23?").await?);
//! # Ok(())
//! # }
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::aiverse::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::aiverse::clients::common::MalformedResponse;
use crate::aiverse::tool_protocol::ToolRegistry;

/// System instruction given to every tool-bearing agent.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Be concise and short. Answer the user's queries using the available tools when necessary.";

/// Query template used by direct agents, which get no system message.
pub const DIRECT_QUERY_TEMPLATE: &str =
    "You are a helpful assistant. Be concise and answer the user query in short:\n\n{query}";

pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;

/// Why an agent could not produce an answer.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationError {
    /// The model identifier names a provider we do not know how to reach.
    UnknownProvider(String),
    /// The provider needs a credential that is not configured.
    MissingCredential { provider: String, variable: String },
    /// Network, authentication or HTTP failure reported by the backend.
    Backend(String),
    /// The backend replied with something that is not a usable answer.
    MalformedResponse(String),
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationError::UnknownProvider(p) => write!(f, "Unknown model provider: {}", p),
            InvocationError::MissingCredential { provider, variable } => {
                write!(f, "Missing credential for {}: {} is not set", provider, variable)
            }
            InvocationError::Backend(msg) => write!(f, "Backend error: {}", msg),
            InvocationError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl Error for InvocationError {}

impl InvocationError {
    fn from_backend(err: Box<dyn Error + Send + Sync>) -> Self {
        if let Some(malformed) = err.downcast_ref::<MalformedResponse>() {
            return InvocationError::MalformedResponse(malformed.0.clone());
        }
        match err.downcast::<InvocationError>() {
            Ok(inner) => *inner,
            Err(other) => InvocationError::Backend(other.to_string()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub parameters: serde_json::Value,
}

/// A named, stateless question answerer.
///
/// Agents keep no conversation history between calls, so one agent may be invoked from several
/// tasks at once.
pub struct Agent {
    name: String,
    client: Arc<dyn ClientWrapper>,
    system_prompt: Option<String>,
    query_template: Option<String>,
    tools: Option<Arc<ToolRegistry>>,
    max_tool_iterations: usize,
}

impl Agent {
    /// Agent using [`DEFAULT_SYSTEM_PROMPT`] and no tools until [`with_tools`](Self::with_tools).
    pub fn new(name: impl Into<String>, client: Arc<dyn ClientWrapper>) -> Self {
        Agent {
            name: name.into(),
            client,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            query_template: None,
            tools: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    /// Agent for backends called without tools or a system message. The instruction is folded
    /// into the user message through [`DIRECT_QUERY_TEMPLATE`].
    pub fn direct(name: impl Into<String>, client: Arc<dyn ClientWrapper>) -> Self {
        Agent {
            name: name.into(),
            client,
            system_prompt: None,
            query_template: Some(DIRECT_QUERY_TEMPLATE.to_string()),
            tools: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_tools(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tools = Some(registry);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Ask the model one question and return its final answer.
    ///
    /// Tool failures are reported back to the model as text so it can recover; only backend
    /// failures end the call with an error.
    pub async fn invoke(&self, query: &str) -> Result<String, InvocationError> {
        let mut messages = Vec::new();
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::new(Role::System, prompt.clone()));
        }

        let user_message = match &self.query_template {
            Some(template) => template.replace("{query}", query),
            None => query.to_string(),
        };
        messages.push(Message::new(
            Role::User,
            self.append_tool_catalogue(user_message),
        ));

        let mut usage = TokenUsage::default();
        let mut current_response = self.call_model(&messages, &mut usage).await?;
        let mut tool_iteration = 0;

        while let Some(tool_call) = parse_tool_call(&current_response) {
            let registry = match &self.tools {
                Some(registry) => registry,
                None => break,
            };
            if tool_iteration >= self.max_tool_iterations {
                warn!(
                    "Agent '{}' reached the tool iteration limit ({})",
                    self.name, self.max_tool_iterations
                );
                current_response = format!(
                    "{}\n\n[Warning: Maximum tool iterations reached]",
                    current_response
                );
                break;
            }
            tool_iteration += 1;

            debug!(
                "Agent '{}' calling tool '{}' with {}",
                self.name, tool_call.name, tool_call.parameters
            );
            let tool_result_message = match registry
                .execute_tool(&tool_call.name, tool_call.parameters)
                .await
            {
                Ok(result) if result.success => format!(
                    "Tool '{}' executed successfully. Result: {}",
                    tool_call.name,
                    result.output_text()
                ),
                Ok(result) => format!(
                    "Tool '{}' failed. Error: {}",
                    tool_call.name,
                    result.error.unwrap_or_else(|| "Unknown error".to_string())
                ),
                Err(e) => format!("Tool execution error: {}", e),
            };

            messages.push(Message::new(Role::Assistant, current_response));
            messages.push(Message::new(Role::User, tool_result_message));
            current_response = self.call_model(&messages, &mut usage).await?;
        }

        debug!(
            "Agent '{}' finished after {} tool call(s), {} tokens",
            self.name, tool_iteration, usage.total_tokens
        );
        Ok(current_response)
    }

    fn append_tool_catalogue(&self, mut message: String) -> String {
        let registry = match &self.tools {
            Some(registry) if !registry.is_empty() => registry,
            _ => return message,
        };

        message.push_str("\n\nYou have access to the following tools:\n");
        for tool in registry.list_tools() {
            message.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            if !tool.parameters.is_empty() {
                message.push_str("  Parameters:\n");
                for param in &tool.parameters {
                    message.push_str(&format!(
                        "    - {} ({:?}): {}\n",
                        param.name,
                        param.param_type,
                        param.description.as_deref().unwrap_or("No description")
                    ));
                }
            }
        }
        message.push_str(
            "\nTo use a tool, respond with a JSON object in the following format:\n\
             {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
             After tool execution, I'll provide the result and you can continue.\n",
        );
        message
    }

    async fn call_model(
        &self,
        messages: &[Message],
        usage: &mut TokenUsage,
    ) -> Result<String, InvocationError> {
        let reply = self
            .client
            .send_message(messages)
            .await
            .map_err(InvocationError::from_backend)?;

        if let Some(last) = self.client.get_last_usage().await {
            usage.input_tokens += last.input_tokens;
            usage.output_tokens += last.output_tokens;
            usage.total_tokens += last.total_tokens;
        }

        if reply.content.trim().is_empty() {
            return Err(InvocationError::MalformedResponse(format!(
                "model '{}' returned an empty reply",
                self.client.model_name()
            )));
        }
        Ok(reply.content)
    }
}

/// Extract the first `{"tool_call": ...}` object embedded in a model reply.
///
/// Models often wrap the JSON in prose, so the fragment is located by brace counting instead of
/// parsing the whole reply.
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let start_idx = response.find("{\"tool_call\"")?;

    let mut brace_count = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end_idx = None;
    for (i, ch) in response[start_idx..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => brace_count += 1,
            '}' => {
                brace_count = brace_count.saturating_sub(1);
                if brace_count == 0 {
                    end_idx = Some(start_idx + i + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let json_str = &response[start_idx..end_idx?];
    let parsed: serde_json::Value = serde_json::from_str(json_str).ok()?;
    let call = parsed.get("tool_call")?;
    let name = call.get("name")?.as_str()?;
    let parameters = call
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    Some(ToolCall {
        name: name.to_string(),
        parameters,
    })
}
