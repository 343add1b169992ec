//! Connection capabilities and collaborators the pool depends on.
//!
//! The pool never sees a concrete transport. It manages anything that
//! implements [`Connection`], creates connections through an injected
//! [`ConnectionFactory`], and reports dead connections to a [`NodeHealth`]
//! sink.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mcbp_protocol::ByteConverter;

use crate::allocator::BufferAllocator;
use crate::error::PoolError;

/// Identity of a connection within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Capabilities the pool requires of a connection.
///
/// Connections are shared between the pool and the caller holding them,
/// so every method takes `&self`; implementations use interior mutability.
pub trait Connection: Send + Sync + 'static {
    /// Identity assigned at creation.
    fn id(&self) -> ConnectionId;

    /// Whether the connection can no longer carry requests.
    fn is_dead(&self) -> bool;

    /// Whether the connection is checked out.
    fn in_use(&self) -> bool;

    /// Record a checkout or a return.
    fn mark_used(&self, in_use: bool);

    /// Whether the connection has been closed.
    fn has_shutdown(&self) -> bool;

    /// Close once idle, checking every `interval`.
    ///
    /// After `max_attempts` checks the connection is closed even if still
    /// in use. Must not block the caller.
    fn countdown_to_close(&self, interval: Duration, max_attempts: u32);

    /// Close the connection. Calling it more than once is a no-op.
    fn dispose(&self);
}

/// Everything a factory needs to build one connection.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Endpoint the pool serves.
    pub endpoint: SocketAddr,
    /// Identity for the new connection.
    pub id: ConnectionId,
    /// Byte converter for framing.
    pub converter: ByteConverter,
    /// Shared buffer allocator.
    pub allocator: Arc<BufferAllocator>,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Timeout for sending a request.
    pub send_timeout: Duration,
    /// Timeout for a graceful shutdown.
    pub shutdown_timeout: Duration,
}

/// Creates connections for a pool.
pub type ConnectionFactory<C> =
    Arc<dyn Fn(&ConnectionContext) -> Result<C, PoolError> + Send + Sync>;

/// Receives liveness reports about the node a pool serves.
///
/// Reports may be delivered while pool locks are held; implementations must
/// not call back into the pool.
pub trait NodeHealth: Send + Sync {
    /// Called when a connection is evicted because it is dead.
    fn connection_died(&self, is_dead: bool);
}

/// Health sink that ignores reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHealth;

impl NodeHealth for NoopHealth {
    fn connection_died(&self, _is_dead: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(255).to_string(), "00000000000000ff");
        assert_eq!(ConnectionId::new(3).get(), 3);
    }
}
