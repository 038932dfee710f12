//! USD → INR conversion using the latest rate from [currencyapi.com](https://currencyapi.com/).

use crate::aiverse::http_client_pool::get_http_client;
use crate::aiverse::tool_protocol::ToolError;
use serde_json::Value as JsonValue;

pub const CURRENCY_API_BASE_URL: &str = "https://api.currencyapi.com";

#[derive(Clone)]
pub struct CurrencyTool {
    api_key: Option<String>,
    base_url: String,
}

impl CurrencyTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: CURRENCY_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch today's USD→INR rate.
    pub async fn usd_to_inr_rate(&self) -> Result<f64, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredential("CURRENCY_API_KEY".to_string()))?;

        let url = format!(
            "{}/v3/latest?apikey={}&currencies=INR",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(api_key)
        );

        let response = get_http_client(&self.base_url)
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::ProtocolError(format!("currency request failed: {}", e)))?;
        let body: JsonValue = response.json().await.map_err(|e| {
            ToolError::ExecutionFailed(format!("currency response is not JSON: {}", e))
        })?;

        parse_inr_rate(&body)
    }

    /// Convert `amount` USD and describe the result.
    pub async fn convert(&self, amount: f64) -> Result<String, ToolError> {
        if !amount.is_finite() {
            return Err(ToolError::InvalidParameters(
                "amount must be a finite number".to_string(),
            ));
        }
        let rate = self.usd_to_inr_rate().await?;
        Ok(describe_conversion(amount, rate))
    }
}

/// Read `data.INR.value` from a `/v3/latest` body.
pub fn parse_inr_rate(body: &JsonValue) -> Result<f64, ToolError> {
    body.pointer("/data/INR/value")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ToolError::ExecutionFailed("missing data.INR.value".to_string()))
}

pub fn describe_conversion(amount: f64, rate: f64) -> String {
    format!("{} USD is equal to {} INR.", amount, amount * rate)
}
