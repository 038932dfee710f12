//! `OpenAIClient` implements [`ClientWrapper`] for any OpenAI-compatible Chat Completions
//! endpoint. The other providers (Ollama, Groq, Gemini) are the same wire protocol on a
//! different host, so they wrap this client with their own base URL and path.
//!
//! ```rust,no_run
//! use aiverse::clients::openai::OpenAIClient;
//! use aiverse::client_wrapper::{ClientWrapper, Message, Role};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = OpenAIClient::new(&std::env::var("OPENAI_API_KEY")?, "gpt-4.1-mini");
//! let reply = client
//!     .send_message(&[Message::new(Role::User, "Hello!")])
//!     .await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

use std::error::Error;

use async_trait::async_trait;
use openai_rust2 as openai_rust;
use tokio::sync::Mutex;

use crate::aiverse::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::aiverse::clients::common::{format_messages, send_and_track};
use crate::aiverse::http_client_pool::get_http_client;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_CHAT_PATH: &str = "/v1/chat/completions";

/// Client wrapper for OpenAI-compatible Chat Completions APIs.
pub struct OpenAIClient {
    client: openai_rust::Client,
    model: String,
    url_path: String,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Client for api.openai.com.
    pub fn new(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, OPENAI_BASE_URL, OPENAI_CHAT_PATH)
    }

    /// Client targeting a custom OpenAI-compatible host.
    ///
    /// `url_path` is the chat completions path on that host (e.g. `/openai/v1/chat/completions`
    /// for Groq).
    pub fn new_with_base_url(
        secret_key: &str,
        model_name: &str,
        base_url: &str,
        url_path: &str,
    ) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                secret_key,
                get_http_client(base_url),
                base_url,
            ),
            model: model_name.to_string(),
            url_path: url_path.to_string(),
            token_usage: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let content = send_and_track(
            &self.client,
            &self.model,
            format_messages(messages),
            Some(self.url_path.clone()),
            &self.token_usage,
        )
        .await?;

        Ok(Message {
            role: Role::Assistant,
            content,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
