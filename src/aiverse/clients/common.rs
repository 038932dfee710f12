use crate::aiverse::client_wrapper::{Message, TokenUsage};
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::error::Error;
use std::fmt;
use tokio::sync::Mutex;

/// The backend answered, but not with something we can use.
#[derive(Debug, Clone)]
pub struct MalformedResponse(pub String);

impl fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed backend response: {}", self.0)
    }
}

impl Error for MalformedResponse {}

/// The backend call itself failed (network, auth, HTTP status).
#[derive(Debug, Clone)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Backend error: {}", self.0)
    }
}

impl Error for BackendError {}

/// Convert our messages into the shape expected by openai_rust.
pub fn format_messages(messages: &[Message]) -> Vec<chat::Message> {
    messages
        .iter()
        .map(|msg| chat::Message {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        })
        .collect()
}

/// Send a chat request, record its usage, and return the assistant's content.
pub async fn send_and_track(
    api: &openai_rust::Client,
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    url_path: Option<String>,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let chat_arguments = chat::ChatArguments::new(model, formatted_msgs);

    let response = match api.create_chat(chat_arguments, url_path).await {
        Ok(response) => response,
        Err(err) => {
            log::error!(
                "aiverse::clients::common::send_and_track(...): model '{}' API error: {}",
                model,
                err
            );
            return Err(Box::new(BackendError(err.to_string())));
        }
    };

    let usage = TokenUsage {
        input_tokens: response.usage.prompt_tokens as usize,
        output_tokens: response.usage.completion_tokens as usize,
        total_tokens: response.usage.total_tokens as usize,
    };
    *usage_slot.lock().await = Some(usage);

    match response.choices.first() {
        Some(choice) => Ok(choice.message.content.clone()),
        None => Err(Box::new(MalformedResponse(format!(
            "model '{}' returned no choices",
            model
        )))),
    }
}
