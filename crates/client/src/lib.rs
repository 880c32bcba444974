//! Provider clients for mcp-search.
//!
//! This crate turns each search backend's transport into the normalized
//! result shape consumed by the server: an HTML-scrape client for
//! DuckDuckGo and a realtime push-channel client for iAsk.ai, both behind
//! the shared cache and rate-limit layer from fathom-core.

pub mod duckduckgo;
pub mod http;
pub mod iask;
pub mod result;

pub use duckduckgo::{DuckDuckGoClient, DuckDuckGoConfig, MAX_RESULTS};
pub use iask::{IAskClient, IAskConfig, NO_RESULTS_SENTINEL};
pub use result::{AskMode, DetailLevel, SearchMode, SearchResult};
