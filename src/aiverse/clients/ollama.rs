use crate::aiverse::client_wrapper::{ClientWrapper, Message, TokenUsage};
use crate::aiverse::clients::openai::OpenAIClient;
use async_trait::async_trait;
use std::error::Error;
use tokio::sync::Mutex;

pub const OLLAMA_CHAT_PATH: &str = "/v1/chat/completions";

/// A local Ollama accepts any bearer token; cloud-proxied models need a real one.
pub const OLLAMA_PLACEHOLDER_KEY: &str = "ollama";

/// Models served by an Ollama daemon through its OpenAI-compatible API.
pub struct OllamaClient {
    client: OpenAIClient,
}

// Cloud models used by the default roster
pub enum Model {
    DeepSeekV31Cloud,
    GptOss120bCloud,
}

fn model_to_string(model: Model) -> String {
    match model {
        Model::DeepSeekV31Cloud => "deepseek-v3.1:671b-cloud".to_string(),
        Model::GptOss120bCloud => "gpt-oss:120b-cloud".to_string(),
    }
}

impl OllamaClient {
    pub fn new_with_model_enum(base_url: &str, secret_key: Option<&str>, model: Model) -> Self {
        Self::new_with_model_str(base_url, secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(base_url: &str, secret_key: Option<&str>, model_name: &str) -> Self {
        OllamaClient {
            client: OpenAIClient::new_with_base_url(
                secret_key.unwrap_or(OLLAMA_PLACEHOLDER_KEY),
                model_name,
                base_url.trim_end_matches('/'),
                OLLAMA_CHAT_PATH,
            ),
        }
    }
}

#[async_trait]
impl ClientWrapper for OllamaClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        self.client.send_message(messages).await
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        self.client.usage_slot()
    }
}
