//! Google search through the [Serper](https://serper.dev) API.
//!
//! The text handed back to the model is the most direct answer Serper offers: the answer box,
//! then the knowledge graph description, then the organic result snippets.

use crate::aiverse::http_client_pool::get_http_client;
use crate::aiverse::tool_protocol::ToolError;
use serde_json::{json, Value as JsonValue};

pub const SERPER_BASE_URL: &str = "https://google.serper.dev";
pub const NO_RESULT_TEXT: &str = "No good Google Search Result was found";

#[derive(Clone)]
pub struct WebSearchTool {
    api_key: Option<String>,
    base_url: String,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: SERPER_BASE_URL.to_string(),
            max_results: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub async fn search(&self, query: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredential("SERPER_API_KEY".to_string()))?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidParameters("query must not be empty".to_string()));
        }

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = get_http_client(&self.base_url)
            .post(&url)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": self.max_results }))
            .send()
            .await
            .map_err(|e| ToolError::ProtocolError(format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "search provider returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("search response is not JSON: {}", e)))?;

        Ok(summarize_results(&body, self.max_results))
    }
}

/// Collapse a Serper response into one answer string.
pub fn summarize_results(body: &JsonValue, max_results: usize) -> String {
    let direct = ["/answerBox/answer", "/answerBox/snippet", "/knowledgeGraph/description"];
    for pointer in direct {
        if let Some(text) = body.pointer(pointer).and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return text.to_string();
            }
        }
    }

    let snippets: Vec<&str> = body
        .get("organic")
        .and_then(|v| v.as_array())
        .map(|results| {
            results
                .iter()
                .filter_map(|r| r.get("snippet").and_then(|s| s.as_str()))
                .take(max_results)
                .collect()
        })
        .unwrap_or_default();

    if snippets.is_empty() {
        NO_RESULT_TEXT.to_string()
    } else {
        snippets.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_box_wins() {
        let body = json!({
            "answerBox": {"answer": "42"},
            "knowledgeGraph": {"description": "kg"},
            "organic": [{"snippet": "s1"}]
        });
        assert_eq!(summarize_results(&body, 10), "42");
    }

    #[test]
    fn test_knowledge_graph_then_organic() {
        let kg = json!({"knowledgeGraph": {"description": "A city in India"}});
        assert_eq!(summarize_results(&kg, 10), "A city in India");

        let organic = json!({"organic": [{"snippet": "one"}, {"title": "t"}, {"snippet": "two"}, {"snippet": "three"}]});
        assert_eq!(summarize_results(&organic, 2), "one two");
    }

    #[test]
    fn test_result_limit_is_configurable() {
        let tool = WebSearchTool::new(Some("key".to_string()));
        assert_eq!(tool.max_results, 10);
        let tool = tool.with_max_results(1);
        assert_eq!(tool.max_results, 1);

        let organic = json!({"organic": [{"snippet": "one"}, {"snippet": "two"}]});
        assert_eq!(summarize_results(&organic, tool.max_results), "one");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(summarize_results(&json!({}), 10), NO_RESULT_TEXT);
    }
}
