//! # kv-driver-pool
//!
//! Per-endpoint connection pool for a key-value cluster client.
//!
//! The pool owns every connection to one node. It is generic over the
//! connection type: anything implementing [`Connection`] can be pooled,
//! and connections are opened through an injected factory.
//!
//! ## Features
//!
//! - Eager creation of `min_size` connections, lazy growth up to `max_size`
//! - Blocking and async acquire with a bounded number of timed-out waits
//! - FIFO wakeup of waiting callers on release
//! - Dead connections evicted on release and reported to a health sink
//! - Graceful disposal that lets in-flight connections finish
//! - Shared buffer allocator handed to every connection
//! - Checkout and eviction metrics
//!
//! ## Example
//!
//! ```rust,ignore
//! use kv_driver_pool::{ConnectionPool, PoolConfig};
//! use std::time::Duration;
//!
//! let config = PoolConfig::new()
//!     .min_size(2)
//!     .max_size(4)
//!     .wait_timeout(Duration::from_millis(500));
//!
//! let pool = ConnectionPool::new(endpoint, config, |ctx| KvConnection::open(ctx))?;
//! pool.initialize();
//!
//! // Get a connection from the pool
//! let conn = pool.get_async().await?;
//! // Use connection...
//! // Connection automatically returned to pool on drop
//!
//! // Check pool status
//! let status = pool.status();
//! println!("Pool utilization: {:.1}%", status.utilization());
//!
//! // Get metrics
//! let metrics = pool.metrics();
//! println!("Checkout success rate: {:.2}", metrics.checkout_success_rate());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pool;
pub mod waiter;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::{BoxError, PoolError};

// Pool types
pub use pool::{ConnectionPool, PoolBuilder, PoolMetrics, PoolStatus, PooledConnection};

// Connection capabilities
pub use lifecycle::{
    Connection, ConnectionContext, ConnectionFactory, ConnectionId, NodeHealth, NoopHealth,
};

// Supporting types
pub use allocator::BufferAllocator;
pub use waiter::Waiter;
