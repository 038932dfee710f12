//! The model-invocation backend contract.
//!
//! A [`ClientWrapper`] is a thin wrapper around one remote chat endpoint. It does not keep any
//! conversation state: an [`Agent`](crate::Agent) builds the message list for every call and
//! hands it to the wrapper, which returns the assistant's reply.

use async_trait::async_trait;
use std::error::Error;
use tokio::sync::Mutex;

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq)]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user (or app user)
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible chat endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }
}

/// Trait defining the interface to interact with the various chat backends.
///
/// Implementations must be safe to share between concurrently running agents: the dispatch
/// core invokes several agents at once and some of them may point at the same provider.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the full message list to the model and return the assistant reply.
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>>;

    /// Model identifier used for requests (without the provider prefix).
    fn model_name(&self) -> &str;

    /// Usage reported by the *last* `send_message()` call.
    /// Default impl returns None so wrappers without accounting don't have to care.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    /// Wrappers that track usage return their slot here.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
