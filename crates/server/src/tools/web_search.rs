//! web_search tool implementation.
//!
//! Performs DuckDuckGo web searches and renders the results as numbered
//! markdown text.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use fathom_client::{DuckDuckGoClient, SearchMode, SearchResult};

/// Input parameters for web_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchParams {
    /// Search query (required).
    pub query: String,

    /// Number of results (1-7, default 3).
    #[serde(default)]
    pub num_results: Option<usize>,

    /// "short" for basic results, "detailed" to include page content.
    #[serde(default)]
    pub mode: Option<SearchMode>,
}

/// Implementation of the web_search tool.
pub async fn search_impl(client: &DuckDuckGoClient, params: WebSearchParams) -> Result<CallToolResult, McpError> {
    let num_results = params.num_results.unwrap_or(3);
    let mode = params.mode.unwrap_or_default();

    let results = client
        .search(&params.query, num_results, mode)
        .await
        .map_err(McpError::from)?;

    tracing::debug!(query = %params.query, count = results.len(), "web_search completed");
    Ok(CallToolResult::success(vec![Content::text(render_results(&results, mode))]))
}

/// Render results as numbered markdown blocks; empty fields are omitted.
fn render_results(results: &[SearchResult], mode: SearchMode) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let mut block = format!("{}. **{}**\nURL: {}\n", index + 1, result.title, result.url);
            if !result.display_url.is_empty() {
                block.push_str(&format!("Display URL: {}\n", result.display_url));
            }
            if !result.snippet.is_empty() {
                block.push_str(&format!("Snippet: {}\n", result.snippet));
            }
            if mode == SearchMode::Detailed && !result.description.is_empty() {
                block.push_str(&format!("Content: {}\n", result.description));
            }
            if !result.favicon.is_empty() {
                block.push_str(&format!("Favicon: {}\n", result.favicon));
            }
            block
        })
        .collect();

    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_client::DuckDuckGoConfig;
    use fathom_core::{CacheStore, RateLimiter};

    fn offline_client() -> DuckDuckGoClient {
        let config = DuckDuckGoConfig { base_url: "http://127.0.0.1:9".to_string(), ..Default::default() };
        DuckDuckGoClient::new(config, CacheStore::disabled(), RateLimiter::disabled()).unwrap()
    }

    fn sample_result() -> SearchResult {
        SearchResult {
            title: "The Rust Book".into(),
            url: "https://doc.rust-lang.org/book/".into(),
            snippet: "An introductory book about Rust.".into(),
            display_url: "doc.rust-lang.org/book".into(),
            favicon: "https://www.google.com/s2/favicons?domain=doc.rust-lang.org&sz=32".into(),
            description: "Full page content here.".into(),
        }
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let params = WebSearchParams { query: "".into(), ..Default::default() };
        let result = search_impl(&offline_client(), params).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_num_results_rejected() {
        let params = WebSearchParams { query: "rust".into(), num_results: Some(50), ..Default::default() };
        let result = search_impl(&offline_client(), params).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_render_short_mode_omits_content() {
        let text = render_results(&[sample_result()], SearchMode::Short);
        assert!(text.starts_with("1. **The Rust Book**\nURL: https://doc.rust-lang.org/book/\n"));
        assert!(text.contains("Display URL: doc.rust-lang.org/book\n"));
        assert!(text.contains("Snippet: An introductory book about Rust.\n"));
        assert!(!text.contains("Content:"));
    }

    #[test]
    fn test_render_detailed_mode_includes_content() {
        let text = render_results(&[sample_result()], SearchMode::Detailed);
        assert!(text.contains("Content: Full page content here.\n"));
    }

    #[test]
    fn test_render_empty_results() {
        assert_eq!(render_results(&[], SearchMode::Short), "No results found.");
    }

    #[test]
    fn test_render_numbers_multiple_results() {
        let results = vec![sample_result(), sample_result()];
        let text = render_results(&results, SearchMode::Short);
        assert!(text.contains("1. **"));
        assert!(text.contains("2. **"));
    }
}
