//! The agent line-up and the tasks built from it.
//!
//! A roster is plain configuration. [`build_tasks`] turns it into [`AgentTask`]s for one query;
//! each task connects its client only when it runs, so a missing API key or unknown provider
//! shows up as that agent's failure instead of aborting the whole dispatch.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::aiverse::agent::Agent;
use crate::aiverse::clients;
use crate::aiverse::config::AiverseConfig;
use crate::aiverse::dispatch::{AgentTask, TaskError};
use crate::aiverse::tool_protocol::ToolRegistry;

/// One agent in the line-up.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    /// Key used in the result set and the text report.
    pub name: String,
    /// `provider:model` identifier.
    pub model: String,
    /// Tool-bearing agents get the shared registry; the others are called directly.
    pub uses_tools: bool,
    /// Heading used in exported reports.
    pub title: String,
    /// File name for the exported markdown.
    pub file_name: String,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        let name = name.into();
        AgentSpec {
            title: name.clone(),
            file_name: format!("{}-response.md", name.to_lowercase().replace(' ', "-")),
            name,
            model: model.into(),
            uses_tools: true,
        }
    }

    pub fn direct(mut self) -> Self {
        self.uses_tools = false;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

/// The six default agents.
pub fn default_roster() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new("DeepSeek", "ollama:deepseek-v3.1:671b-cloud")
            .with_file_name("deepseek-response.md"),
        AgentSpec::new("OpenAI", "ollama:gpt-oss:120b-cloud")
            .with_title("OpenAI GPT")
            .with_file_name("openai-gpt-response.md"),
        AgentSpec::new("Qwen", "groq:qwen/qwen3-32b")
            .with_title("Alibaba Qwen 3")
            .with_file_name("alibaba-qwen-response.md"),
        AgentSpec::new("Llama", "groq:llama-3.3-70b-versatile")
            .with_title("Meta Llama 3")
            .with_file_name("meta-llama3-response.md"),
        AgentSpec::new("Kimi", "groq:moonshotai/kimi-k2-instruct-0905")
            .with_title("Kimi K2")
            .with_file_name("kimi-k2-response.md"),
        AgentSpec::new("Google", "google:gemma-3-27b-it")
            .direct()
            .with_title("Google Gemini")
            .with_file_name("google-gemini-response.md"),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum RosterError {
    UnknownAgent(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::UnknownAgent(name) => write!(f, "Unknown agent: {}", name),
        }
    }
}

impl Error for RosterError {}

/// Keep only the named agents (case-insensitive), in roster order.
pub fn select_agents(roster: &[AgentSpec], names: &[String]) -> Result<Vec<AgentSpec>, RosterError> {
    for wanted in names {
        if !roster.iter().any(|spec| spec.name.eq_ignore_ascii_case(wanted.trim())) {
            return Err(RosterError::UnknownAgent(wanted.clone()));
        }
    }
    Ok(roster
        .iter()
        .filter(|spec| names.iter().any(|n| spec.name.eq_ignore_ascii_case(n.trim())))
        .cloned()
        .collect())
}

/// One task per roster entry, each answering `query`.
pub fn build_tasks(
    roster: &[AgentSpec],
    query: &str,
    config: &AiverseConfig,
    tools: Option<Arc<ToolRegistry>>,
) -> Vec<AgentTask> {
    roster
        .iter()
        .map(|spec| {
            let spec = spec.clone();
            let query = query.to_string();
            let config = config.clone();
            let tools = tools.clone();
            let name = spec.name.clone();

            AgentTask::new(name, move || async move {
                let client = clients::connect(&spec.model, &config).map_err(TaskError::from)?;
                let agent = if spec.uses_tools {
                    let agent = Agent::new(spec.name.clone(), client);
                    match tools {
                        Some(registry) => agent.with_tools(registry),
                        None => agent,
                    }
                } else {
                    Agent::direct(spec.name.clone(), client)
                };
                agent.invoke(&query).await.map_err(TaskError::from)
            })
        })
        .collect()
}
