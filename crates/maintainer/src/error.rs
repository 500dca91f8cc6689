//! Errors reported by the routing-lookup and connect capabilities.

use thiserror::Error;

/// Routing lookup failed. The peer stays unresolved until the next refresh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup timed out")]
    Timeout,
    #[error("peer not found")]
    NotFound,
    #[error("lookup transport error: {0}")]
    Transport(String),
}

/// Connection attempt failed. Retried on the next connect pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("connect deadline exceeded")]
    Timeout,
    #[error("dial failed: {0}")]
    Dial(String),
    #[error("connect transport error: {0}")]
    Transport(String),
}
