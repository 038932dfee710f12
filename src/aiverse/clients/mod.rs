//! Provider specific [`ClientWrapper`] implementations.
//!
//! Every provider speaks the OpenAI Chat Completions protocol, so the concrete clients are thin
//! wrappers around [`openai::OpenAIClient`] pointed at a different host. [`connect`] turns a
//! `provider:model` identifier into one of them.

pub mod common;

pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod openai;

use std::fmt;
use std::sync::Arc;

use crate::aiverse::agent::InvocationError;
use crate::aiverse::client_wrapper::ClientWrapper;
use crate::aiverse::config::AiverseConfig;

/// Model providers reachable through [`connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    Groq,
    Google,
    OpenAI,
}

impl Provider {
    pub fn parse(name: &str) -> Option<Provider> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Provider::Ollama),
            "groq" => Some(Provider::Groq),
            "google" | "gemini" => Some(Provider::Google),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::Groq => "groq",
            Provider::Google => "google",
            Provider::OpenAI => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split `provider:model` on the first `:`. Model names may contain further colons
/// (`ollama:deepseek-v3.1:671b-cloud`).
pub fn parse_model_identifier(identifier: &str) -> Result<(Provider, String), InvocationError> {
    let (provider, model) = identifier
        .split_once(':')
        .ok_or_else(|| InvocationError::UnknownProvider(identifier.to_string()))?;
    let provider = Provider::parse(provider)
        .ok_or_else(|| InvocationError::UnknownProvider(provider.to_string()))?;
    if model.trim().is_empty() {
        return Err(InvocationError::UnknownProvider(identifier.to_string()));
    }
    Ok((provider, model.to_string()))
}

fn require_key(
    key: &Option<String>,
    provider: Provider,
    variable: &str,
) -> Result<String, InvocationError> {
    key.clone().ok_or_else(|| InvocationError::MissingCredential {
        provider: provider.to_string(),
        variable: variable.to_string(),
    })
}

/// Build the client for a model identifier.
pub fn connect(
    identifier: &str,
    config: &AiverseConfig,
) -> Result<Arc<dyn ClientWrapper>, InvocationError> {
    let (provider, model) = parse_model_identifier(identifier)?;
    log::debug!("Connecting {} model '{}'", provider, model);

    let client: Arc<dyn ClientWrapper> = match provider {
        Provider::Ollama => Arc::new(ollama::OllamaClient::new_with_model_str(
            &config.ollama_base_url,
            config.ollama_api_key.as_deref(),
            &model,
        )),
        Provider::Groq => {
            let key = require_key(&config.groq_api_key, provider, "GROQ_API_KEY")?;
            Arc::new(groq::GroqClient::new_with_model_str(&key, &model))
        }
        Provider::Google => {
            let key = require_key(&config.google_api_key, provider, "GOOGLE_API_KEY")?;
            Arc::new(gemini::GeminiClient::new_with_model_str(&key, &model))
        }
        Provider::OpenAI => {
            let key = require_key(&config.openai_api_key, provider, "OPENAI_API_KEY")?;
            Arc::new(openai::OpenAIClient::new(&key, &model))
        }
    };
    Ok(client)
}
