//! Core types and shared functionality for mcp-search.
//!
//! This crate provides:
//! - SQLite-backed store for cached payloads and rate windows
//! - Advisory read-through cache and fail-open rate limiter
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod store;

pub use cache::CacheStore;
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use ratelimit::RateLimiter;
pub use store::StoreDb;
