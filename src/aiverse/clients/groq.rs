use crate::aiverse::client_wrapper::{ClientWrapper, Message, TokenUsage};
use crate::aiverse::clients::openai::OpenAIClient;
use async_trait::async_trait;
use std::error::Error;
use tokio::sync::Mutex;

pub const GROQ_BASE_URL: &str = "https://api.groq.com";
pub const GROQ_CHAT_PATH: &str = "/openai/v1/chat/completions";

/// Groq-hosted open-weight models, served over an OpenAI-compatible endpoint.
pub struct GroqClient {
    client: OpenAIClient,
}

// Models used by the default roster
pub enum Model {
    Qwen3_32B,
    Llama33_70BVersatile,
    KimiK2Instruct0905,
}

fn model_to_string(model: Model) -> String {
    match model {
        Model::Qwen3_32B => "qwen/qwen3-32b".to_string(),
        Model::Llama33_70BVersatile => "llama-3.3-70b-versatile".to_string(),
        Model::KimiK2Instruct0905 => "moonshotai/kimi-k2-instruct-0905".to_string(),
    }
}

impl GroqClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        GroqClient {
            client: OpenAIClient::new_with_base_url(
                secret_key,
                model_name,
                GROQ_BASE_URL,
                GROQ_CHAT_PATH,
            ),
        }
    }
}

#[async_trait]
impl ClientWrapper for GroqClient {
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
