//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate provider.

use crate::tools::{IAskSearchParams, WebSearchParams, iask_search, web_search};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use fathom_client::{DuckDuckGoClient, DuckDuckGoConfig, IAskClient, IAskConfig};
use fathom_core::{AppConfig, CacheStore, Error, RateLimiter, StoreDb};

/// The main MCP server handler for mcp-search.
#[derive(Clone)]
pub struct SearchServer {
    duckduckgo: DuckDuckGoClient,
    iask: IAskClient,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SearchServer {
    /// Create a new server handler.
    ///
    /// Both providers share the cache and rate limiter over the same store;
    /// with no store they degrade to pass-through.
    pub fn new(config: &AppConfig, store: Option<StoreDb>) -> Result<Self, Error> {
        let cache = CacheStore::new(store.clone());
        let limiter = RateLimiter::new(store);
        tracing::info!(caching = cache.is_enabled(), "shared store layer ready");

        let duckduckgo = DuckDuckGoClient::new(
            DuckDuckGoConfig {
                timeout: config.timeout(),
                user_agent: config.user_agent.clone(),
                rate_limit: config.rate_limit,
                rate_window_secs: config.rate_window_secs,
                ..Default::default()
            },
            cache.clone(),
            limiter,
        )?;

        let iask = IAskClient::new(
            IAskConfig {
                user_agent: config.user_agent.clone(),
                connect_timeout: config.connect_timeout(),
                response_timeout: config.response_timeout(),
                ..Default::default()
            },
            cache,
        );

        Ok(Self { duckduckgo, iask, tool_router: Self::tool_router() })
    }

    /// Search the web via DuckDuckGo.
    #[tool(
        description = "Perform a web search using DuckDuckGo and receive results including titles, URLs, and snippets. Detailed mode also fetches page content per result."
    )]
    async fn web_search(&self, params: Parameters<WebSearchParams>) -> Result<CallToolResult, McpError> {
        web_search::search_impl(&self.duckduckgo, params.0).await
    }

    /// Ask iAsk.ai a question.
    #[tool(
        description = "AI-powered search using iAsk.ai. Retrieves comprehensive, AI-generated answers based on web content. Supports modes (question, academic, forums, wiki, thinking) and detail levels (concise, detailed, comprehensive)."
    )]
    async fn iask_search(&self, params: Parameters<IAskSearchParams>) -> Result<CallToolResult, McpError> {
        iask_search::ask_impl(&self.iask, params.0).await
    }
}

impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-search".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
