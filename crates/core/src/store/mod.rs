//! SQLite-backed store for cached payloads and rate-limit windows.
//!
//! This module provides the persistent backing for the cache and the
//! fixed-window rate limiter, with async access via tokio-rusqlite:
//!
//! - TTL key/value entries with RFC3339 TEXT expiry
//! - Atomic fixed-window counter increments
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod kv;
pub mod migrations;
pub mod windows;

pub use crate::Error;

pub use connection::StoreDb;
