//! Error types for topology tracking and routing.

use thiserror::Error;

/// Result type alias for routing core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the routing core.
///
/// Only conditions the caller must act on live here. An incomplete scan is
/// reported as `None` and a stale topology as [`PublishOutcome::Stale`].
///
/// [`PublishOutcome::Stale`]: crate::routing::PublishOutcome::Stale
#[derive(Error, Debug)]
pub enum Error {
    /// An argument violated a constructor or operation precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Routing was attempted against a topology with no nodes.
    #[error("empty topology: no nodes available for routing")]
    EmptyTopology,

    /// A node entry in a configuration document could not be used.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// A configuration document could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A single document grew past the configured buffer limit.
    #[error("document too large: {size} bytes buffered, limit is {limit}")]
    DocumentTooLarge { size: usize, limit: usize },

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}
