//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-search server.

pub mod iask_search;
pub mod web_search;

pub use iask_search::IAskSearchParams;
pub use web_search::WebSearchParams;
