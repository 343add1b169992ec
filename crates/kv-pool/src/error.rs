//! Pool error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Boxed error returned by connection factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while using the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No connection could be obtained within the retry bound.
    #[error("no connection to {endpoint} available after {attempts} attempts")]
    ConnectionUnavailable {
        /// Endpoint the pool serves.
        endpoint: SocketAddr,
        /// Number of timed-out or failed attempts.
        attempts: u32,
    },

    /// The pool has been disposed.
    #[error("connection pool is closed")]
    PoolClosed,

    /// The connection factory failed.
    #[error("failed to create connection: {0}")]
    Connect(#[source] BoxError),

    /// Invalid pool configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PoolError {
    /// Wrap a factory error.
    pub fn connect(error: impl Into<BoxError>) -> Self {
        Self::Connect(error.into())
    }

    /// Whether the error reports pool exhaustion.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionUnavailable { .. })
    }
}
