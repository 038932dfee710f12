//! Built-in tool implementations.
//!
//! - **get_current_weather**: current conditions for a location (weatherapi.com)
//! - **usd_to_inr**: USD → INR conversion at the latest rate (currencyapi.com)
//! - **web_search**: Google search results through Serper
//! - **calculator**: arithmetic evaluation
//!
//! [`builtin_registry`] registers all four on a [`CustomToolProtocol`] and returns the
//! [`ToolRegistry`] handed to every tool-bearing agent. Credentials come from
//! [`AiverseConfig`]; a missing key only fails the tool call that needs it.

pub mod calculator;
pub mod currency;
pub mod weather;
pub mod web_search;

pub use calculator::{Calculator, CalculatorError, CalculatorResult};
pub use currency::CurrencyTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

use crate::aiverse::config::AiverseConfig;
use crate::aiverse::tool_protocol::{
    ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolRegistry, ToolResult,
};
use crate::aiverse::tool_protocols::{CustomToolProtocol, ToolFuture};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::sync::Arc;

pub const WEATHER_TOOL: &str = "get_current_weather";
pub const CURRENCY_TOOL: &str = "usd_to_inr";
pub const WEB_SEARCH_TOOL: &str = "web_search";
pub const CALCULATOR_TOOL: &str = "calculator";

fn string_param(params: &JsonValue, name: &str) -> Result<String, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidParameters(format!("'{}' must be a string", name)))
}

/// Accepts both `10` and `"10"`; models are not consistent about quoting numbers.
fn number_param(params: &JsonValue, name: &str) -> Result<f64, ToolError> {
    match params.get(name) {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::InvalidParameters(format!("'{}' must be a number", name)))
}

fn into_tool_result(
    result: Result<String, ToolError>,
) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
    match result {
        Ok(text) => Ok(ToolResult::success(JsonValue::String(text))),
        Err(err) => Err(Box::new(err)),
    }
}

/// Register the four built-in tools and return a registry ready to share between agents.
pub async fn builtin_registry(
    config: &AiverseConfig,
) -> Result<Arc<ToolRegistry>, Box<dyn Error + Send + Sync>> {
    let protocol = Arc::new(CustomToolProtocol::new());

    let weather = WeatherTool::new(config.weather_api_key.clone());
    protocol
        .register_async_tool(
            ToolMetadata::new(
                WEATHER_TOOL,
                "useful to get the current weather for a given location",
            )
            .with_parameter(
                ToolParameter::new("location", ToolParameterType::String)
                    .with_description("City or place name")
                    .required(),
            ),
            Arc::new(move |params: JsonValue| -> ToolFuture {
                let weather = weather.clone();
                Box::pin(async move {
                    let result = match string_param(&params, "location") {
                        Ok(location) => weather.current_weather(&location).await,
                        Err(e) => Err(e),
                    };
                    into_tool_result(result)
                })
            }),
        )
        .await;

    let currency = CurrencyTool::new(config.currency_api_key.clone());
    protocol
        .register_async_tool(
            ToolMetadata::new(CURRENCY_TOOL, "Useful to Convert USD to INR").with_parameter(
                ToolParameter::new("amount", ToolParameterType::Number)
                    .with_description("Amount in US dollars")
                    .required(),
            ),
            Arc::new(move |params: JsonValue| -> ToolFuture {
                let currency = currency.clone();
                Box::pin(async move {
                    let result = match number_param(&params, "amount") {
                        Ok(amount) => currency.convert(amount).await,
                        Err(e) => Err(e),
                    };
                    into_tool_result(result)
                })
            }),
        )
        .await;

    let search = WebSearchTool::new(config.serper_api_key.clone());
    protocol
        .register_async_tool(
            ToolMetadata::new(
                WEB_SEARCH_TOOL,
                "Useful for when you need to answer questions about current events or look up real-time information.",
            )
            .with_parameter(
                ToolParameter::new("query", ToolParameterType::String)
                    .with_description("Search query")
                    .required(),
            ),
            Arc::new(move |params: JsonValue| -> ToolFuture {
                let search = search.clone();
                Box::pin(async move {
                    let result = match string_param(&params, "query") {
                        Ok(query) => search.search(&query).await,
                        Err(e) => Err(e),
                    };
                    into_tool_result(result)
                })
            }),
        )
        .await;

    let calc = Calculator::new();
    protocol
        .register_async_tool(
            ToolMetadata::new(CALCULATOR_TOOL, "Perform mathematical calculations.").with_parameter(
                ToolParameter::new("expression", ToolParameterType::String)
                    .with_description("Arithmetic expression, e.g. (12.5 * 4) / 3")
                    .required(),
            ),
            Arc::new(move |params: JsonValue| -> ToolFuture {
                let calc = calc.clone();
                Box::pin(async move {
                    let result = match string_param(&params, "expression") {
                        Ok(expr) => calc
                            .evaluate(&expr)
                            .await
                            .map(calculator::format_number)
                            .map_err(|e| ToolError::ExecutionFailed(e.to_string())),
                        Err(e) => Err(e),
                    };
                    into_tool_result(result)
                })
            }),
        )
        .await;

    let mut registry = ToolRegistry::new(protocol);
    registry.discover_tools().await?;
    Ok(Arc::new(registry))
}
