use crate::aiverse::client_wrapper::{ClientWrapper, Message, TokenUsage};
use crate::aiverse::clients::openai::OpenAIClient;
use async_trait::async_trait;
use std::error::Error;
use tokio::sync::Mutex;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_CHAT_PATH: &str = "/v1beta/openai/chat/completions";

/// Google models (Gemini and Gemma) through Google's OpenAI compatibility layer.
pub struct GeminiClient {
    client: OpenAIClient,
}

pub enum Model {
    Gemma3_27bIt,
    Gemini25Flash,
    Gemini25Pro,
}

fn model_to_string(model: Model) -> String {
    match model {
        Model::Gemma3_27bIt => "gemma-3-27b-it".to_string(),
        Model::Gemini25Flash => "gemini-2.5-flash".to_string(),
        Model::Gemini25Pro => "gemini-2.5-pro".to_string(),
    }
}

impl GeminiClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        GeminiClient {
            client: OpenAIClient::new_with_base_url(
                secret_key,
                model_name,
                GEMINI_BASE_URL,
                GEMINI_CHAT_PATH,
            ),
        }
    }
}

#[async_trait]
impl ClientWrapper for GeminiClient {
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
