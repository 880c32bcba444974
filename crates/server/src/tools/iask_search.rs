//! iask_search tool implementation.
//!
//! Asks the iAsk.ai realtime backend a question and returns the answer
//! text verbatim.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use fathom_client::{AskMode, DetailLevel, IAskClient};

/// Input parameters for iask_search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IAskSearchParams {
    /// The question to ask. Supports natural language.
    pub query: String,

    /// Search mode: "question", "academic", "forums", "wiki", or "thinking"
    /// (default question).
    #[serde(default)]
    pub mode: Option<AskMode>,

    /// Level of detail: "concise", "detailed", or "comprehensive" (default
    /// concise).
    #[serde(default)]
    pub detail_level: Option<DetailLevel>,
}

/// Implementation of the iask_search tool.
pub async fn ask_impl(client: &IAskClient, params: IAskSearchParams) -> Result<CallToolResult, McpError> {
    let mode = params.mode.unwrap_or(AskMode::Question);
    let detail_level = params.detail_level.or(Some(DetailLevel::Concise));

    let answer = client
        .ask(&params.query, mode, detail_level)
        .await
        .map_err(McpError::from)?;

    tracing::debug!(%mode, chars = answer.len(), "iask_search completed");
    Ok(CallToolResult::success(vec![Content::text(answer)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_client::IAskConfig;
    use fathom_core::CacheStore;

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let client = IAskClient::new(IAskConfig::default(), CacheStore::disabled());
        let params = IAskSearchParams { query: "".into(), ..Default::default() };
        let result = ask_impl(&client, params).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: IAskSearchParams = serde_json::from_str(r#"{"query":"what is rust"}"#).unwrap();
        assert_eq!(params.query, "what is rust");
        assert!(params.mode.is_none());
        assert!(params.detail_level.is_none());
    }

    #[test]
    fn test_params_deserialize_explicit_mode() {
        let params: IAskSearchParams =
            serde_json::from_str(r#"{"query":"q","mode":"academic","detail_level":"comprehensive"}"#).unwrap();
        assert_eq!(params.mode, Some(AskMode::Academic));
        assert_eq!(params.detail_level, Some(DetailLevel::Comprehensive));
    }
}
