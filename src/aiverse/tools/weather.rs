//! Current-weather lookup backed by [weatherapi.com](https://www.weatherapi.com/).

use crate::aiverse::http_client_pool::get_http_client;
use crate::aiverse::tool_protocol::ToolError;
use serde_json::Value as JsonValue;

pub const WEATHER_API_BASE_URL: &str = "http://api.weatherapi.com/v1";

/// Client for the `current.json` endpoint.
#[derive(Clone)]
pub struct WeatherTool {
    api_key: Option<String>,
    base_url: String,
}

impl WeatherTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: WEATHER_API_BASE_URL.to_string(),
        }
    }

    /// Point the tool at another host (used by tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full request URL for `location`.
    pub fn request_url(&self, api_key: &str, location: &str) -> String {
        format!(
            "{}/current.json?key={}&q={}&aqi=no",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(api_key),
            urlencoding::encode(location)
        )
    }

    /// Fetch the current conditions for `location` and describe them in one sentence.
    pub async fn current_weather(&self, location: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredential("WEATHER_API_KEY".to_string()))?;
        if location.trim().is_empty() {
            return Err(ToolError::InvalidParameters(
                "location must not be empty".to_string(),
            ));
        }

        let url = self.request_url(api_key, location);
        log::debug!("WeatherTool::current_weather(): GET {}/current.json", self.base_url);

        let response = get_http_client(&self.base_url)
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::ProtocolError(format!("weather request failed: {}", e)))?;
        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("weather response is not JSON: {}", e)))?;

        describe_weather(location, &body)
    }
}

/// Turn a `current.json` body into the sentence handed back to the model.
pub fn describe_weather(location: &str, body: &JsonValue) -> Result<String, ToolError> {
    if let Some(message) = body.pointer("/error/message").and_then(|v| v.as_str()) {
        return Err(ToolError::ExecutionFailed(format!(
            "weather provider error: {}",
            message
        )));
    }

    let temp_c = body
        .pointer("/current/temp_c")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ToolError::ExecutionFailed("missing current.temp_c".to_string()))?;
    let condition = body
        .pointer("/current/condition/text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::ExecutionFailed("missing current.condition.text".to_string()))?;

    Ok(format!(
        "The current temperature in {} is {}°C with {}.",
        location, temp_c, condition
    ))
}
