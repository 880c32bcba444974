//! Unified error types for mcp-search.
//!
//! Every provider failure maps into this taxonomy so the tool layer can
//! report a stable code plus a message naming the backend and cause.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the mcp-search server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query, out-of-range count).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Fixed-window quota exceeded; no network call was made.
    #[error("RATE_LIMITED: {0}")]
    RateLimited(String),

    /// Hostname could not be resolved.
    #[error("DNS_FAILURE: {0}")]
    DnsFailure(String),

    /// Backend actively refused the connection.
    #[error("CONNECTION_REFUSED: {0}")]
    ConnectionRefused(String),

    /// Request or connection attempt exceeded its deadline.
    #[error("TIMEOUT: {0}")]
    Timeout(String),

    /// Other transport-level failure.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Backend response shape violates the expected contract.
    #[error("PROTOCOL_ERROR: {0}")]
    Protocol(String),

    /// Markup or payload could not be interpreted.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Backing store operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::RateLimited(msg) => (-32001, msg.clone()),
            Error::DnsFailure(msg) => (-32002, msg.clone()),
            Error::ConnectionRefused(msg) => (-32003, msg.clone()),
            Error::Timeout(msg) => (-32004, msg.clone()),
            Error::Network(msg) => (-32005, msg.clone()),
            Error::Protocol(msg) => (-32006, msg.clone()),
            Error::Parse(msg) => (-32007, msg.clone()),
            Error::Database(e) => (-32008, e.to_string()),
            Error::MigrationFailed(msg) => (-32008, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::RateLimited("duckduckgo: too many requests".to_string());
        assert!(err.to_string().contains("RATE_LIMITED"));
        assert!(err.to_string().contains("duckduckgo"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::Timeout("iask: no response received".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32004);
    }

    #[test]
    fn test_validation_uses_invalid_params_code() {
        let err = Error::InvalidInput("query cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }
}
