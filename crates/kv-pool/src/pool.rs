//! Connection pool implementation.
//!
//! The pool hands out connections to one endpoint, grows lazily up to its
//! maximum, and queues callers when every connection is checked out. A
//! release wakes at most one queued caller, in FIFO order, skipping callers
//! whose wait already timed out.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use mcbp_protocol::ByteConverter;
use parking_lot::Mutex;
use tracing::Span;
use uuid::Uuid;

use crate::allocator::BufferAllocator;
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::lifecycle::{
    Connection, ConnectionContext, ConnectionFactory, ConnectionId, NodeHealth, NoopHealth,
};
use crate::waiter::Waiter;

/// Idle buffers kept per connection slot.
const BUFFERS_PER_CONNECTION: usize = 2;

/// A bounded pool of connections to a single endpoint.
///
/// Cloning the pool is cheap; clones share the same connections.
///
/// # Example
///
/// ```rust,ignore
/// use kv_driver_pool::{ConnectionPool, PoolConfig};
///
/// let pool = ConnectionPool::builder()
///     .endpoint("10.0.0.1:11210".parse()?)
///     .config(PoolConfig::new().min_size(2).max_size(4))
///     .factory(|ctx| KvConnection::connect(ctx))
///     .build()?;
///
/// pool.initialize();
/// let conn = pool.get_async().await?;
/// // Use connection...
/// // Connection automatically returned to pool on drop
/// ```
pub struct ConnectionPool<C: Connection> {
    config: PoolConfig,
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C: Connection> {
    config: PoolConfig,
    endpoint: SocketAddr,
    pool_id: Uuid,
    span: Span,
    factory: ConnectionFactory<C>,
    health: Arc<dyn NodeHealth>,
    converter: ByteConverter,
    allocator: Arc<BufferAllocator>,

    /// Connections ready to be handed out.
    idle: Mutex<VecDeque<Arc<C>>>,
    /// Every live connection, idle or checked out.
    refs: Mutex<HashMap<ConnectionId, Arc<C>>>,
    live_count: AtomicUsize,
    /// Timed-out waits since the last successful acquire.
    acquire_failures: AtomicU32,
    /// Guards the grow decision and connection removal.
    create_lock: Mutex<()>,
    /// Callers waiting for a release, oldest first.
    waiters: Mutex<VecDeque<Arc<Waiter>>>,
    disposed: AtomicBool,
    initialization_failed: AtomicBool,
    next_connection_id: AtomicU64,
    created_at: Instant,
    metrics: Mutex<PoolMetricsInner>,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    connections_created: u64,
    connections_closed: u64,
    dead_connections: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
    waits_timed_out: u64,
}

enum Attempt<C> {
    Ready(Arc<C>),
    Wait(Arc<Waiter>),
}

impl<C: Connection> ConnectionPool<C> {
    /// Create a new pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder<C> {
        PoolBuilder::new()
    }

    /// Create a pool with the default health sink and log span.
    ///
    /// No connections are opened until [`initialize`](Self::initialize) or
    /// the first acquire.
    pub fn new<F>(endpoint: SocketAddr, config: PoolConfig, factory: F) -> Result<Self, PoolError>
    where
        F: Fn(&ConnectionContext) -> Result<C, PoolError> + Send + Sync + 'static,
    {
        Self::builder()
            .endpoint(endpoint)
            .config(config)
            .factory(factory)
            .build()
    }

    /// Eagerly open `min_size` connections.
    ///
    /// A factory failure stops initialization and sets
    /// [`initialization_failed`](Self::initialization_failed); the pool
    /// stays usable and grows on demand.
    pub fn initialize(&self) {
        self.inner.initialize();
    }

    /// Acquire a connection, blocking the thread while the pool is
    /// exhausted.
    ///
    /// Each wait lasts at most `wait_timeout`. After
    /// `max_acquire_retry_count` timed-out waits the call fails with
    /// [`PoolError::ConnectionUnavailable`].
    pub fn acquire(&self) -> Result<Arc<C>, PoolError> {
        self.inner.acquire_blocking()
    }

    /// Acquire a connection without blocking the thread.
    ///
    /// Same retry and failure rules as [`acquire`](Self::acquire).
    pub async fn acquire_async(&self) -> Result<Arc<C>, PoolError> {
        self.inner.acquire_async().await
    }

    /// Acquire a connection that returns itself to the pool on drop.
    pub fn get(&self) -> Result<PooledConnection<C>, PoolError> {
        let conn = self.inner.acquire_blocking()?;
        Ok(PooledConnection::new(conn, Arc::clone(&self.inner)))
    }

    /// Async variant of [`get`](Self::get).
    pub async fn get_async(&self) -> Result<PooledConnection<C>, PoolError> {
        let conn = self.inner.acquire_async().await?;
        Ok(PooledConnection::new(conn, Arc::clone(&self.inner)))
    }

    /// Return a connection to the pool.
    ///
    /// Dead connections are closed and removed, making room for a new one.
    pub fn release(&self, conn: Arc<C>) {
        self.inner.release(conn);
    }

    /// Close the pool.
    ///
    /// Idle connections are closed immediately; checked-out connections are
    /// asked to close once idle. Later acquires fail with
    /// [`PoolError::PoolClosed`]. Calling it again has no effect.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Number of live connections, idle or checked out.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.live_count.load(Ordering::Acquire)
    }

    /// Snapshot of the idle connections.
    #[must_use]
    pub fn connections(&self) -> Vec<Arc<C>> {
        self.inner.idle.lock().iter().cloned().collect()
    }

    /// Whether eager initialization hit a factory failure.
    #[must_use]
    pub fn initialization_failed(&self) -> bool {
        self.inner.initialization_failed.load(Ordering::Acquire)
    }

    /// Whether the pool has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Endpoint the pool serves.
    #[must_use]
    pub fn endpoint(&self) -> SocketAddr {
        self.inner.endpoint
    }

    /// Identity of the pool, as it appears in logs.
    #[must_use]
    pub fn pool_id(&self) -> Uuid {
        self.inner.pool_id
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Buffer allocator shared by the pool's connections.
    #[must_use]
    pub fn allocator(&self) -> &Arc<BufferAllocator> {
        &self.inner.allocator
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let available = self.inner.idle.lock().len();
        let total = self.count();
        PoolStatus {
            available,
            in_use: total.saturating_sub(available),
            total,
            max: self.config.max_size,
        }
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            dead_connections: inner.dead_connections,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            waits_timed_out: inner.waits_timed_out,
            uptime: self.inner.created_at.elapsed(),
        }
    }
}

impl<C: Connection> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("endpoint", &self.inner.endpoint)
            .field("pool_id", &self.inner.pool_id)
            .field("count", &self.count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<C: Connection> PoolInner<C> {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn context(&self, id: ConnectionId) -> ConnectionContext {
        ConnectionContext {
            endpoint: self.endpoint,
            id,
            converter: self.converter,
            allocator: Arc::clone(&self.allocator),
            connect_timeout: self.config.connect_timeout,
            send_timeout: self.config.send_timeout,
            shutdown_timeout: self.config.shutdown_timeout,
        }
    }

    /// Open and register one connection. Caller holds `create_lock`.
    fn create(&self) -> Result<Arc<C>, PoolError> {
        let id = ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let conn = match (self.factory)(&self.context(id)) {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                tracing::warn!(parent: &self.span, error = %e, "failed to create connection");
                return Err(e);
            }
        };

        self.refs.lock().insert(conn.id(), Arc::clone(&conn));
        let count = self.live_count.fetch_add(1, Ordering::AcqRel) + 1;
        self.metrics.lock().connections_created += 1;
        tracing::info!(
            parent: &self.span,
            connection_id = %conn.id(),
            count,
            "connection created"
        );
        Ok(conn)
    }

    /// Close a connection and forget it. Caller holds `create_lock`.
    ///
    /// Returns `false` if the pool no longer tracked the connection.
    fn destroy(&self, conn: &Arc<C>) -> bool {
        conn.dispose();
        let removed = self.refs.lock().remove(&conn.id()).is_some();
        if removed {
            self.live_count.fetch_sub(1, Ordering::AcqRel);
            self.metrics.lock().connections_closed += 1;
        }
        removed
    }

    fn initialize(&self) {
        let _guard = self.create_lock.lock();
        while !self.is_disposed()
            && self.idle.lock().len() < self.config.min_size
            && self.live_count.load(Ordering::Acquire) < self.config.max_size
        {
            match self.create() {
                Ok(conn) => self.idle.lock().push_back(conn),
                Err(e) => {
                    tracing::info!(
                        parent: &self.span,
                        error = %e,
                        "pool initialization failed"
                    );
                    self.initialization_failed.store(true, Ordering::Release);
                    return;
                }
            }
        }
    }

    /// Hand out an idle connection or grow the pool. Never waits.
    fn try_acquire(&self) -> Result<Option<Arc<C>>, PoolError> {
        loop {
            let Some(conn) = self.idle.lock().pop_front() else {
                break;
            };
            if conn.is_dead() {
                self.evict_dead(&conn);
                continue;
            }
            if self.is_disposed() {
                let _guard = self.create_lock.lock();
                self.destroy(&conn);
                continue;
            }
            self.checked_out(&conn);
            tracing::debug!(
                parent: &self.span,
                connection_id = %conn.id(),
                "acquired idle connection"
            );
            return Ok(Some(conn));
        }

        let _guard = self.create_lock.lock();
        if self.is_disposed() || self.live_count.load(Ordering::Acquire) >= self.config.max_size {
            return Ok(None);
        }
        match self.create() {
            Ok(conn) => {
                self.checked_out(&conn);
                Ok(Some(conn))
            }
            Err(e) => {
                self.acquire_failures.fetch_add(1, Ordering::AcqRel);
                self.metrics.lock().checkouts_failed += 1;
                Err(e)
            }
        }
    }

    fn checked_out(&self, conn: &Arc<C>) {
        self.acquire_failures.store(0, Ordering::Release);
        conn.mark_used(true);
        self.metrics.lock().checkouts_successful += 1;
    }

    /// Try to acquire, else enqueue a waiter. Both steps happen under the
    /// waiter lock so a release cannot slip between them.
    fn attempt(&self) -> Result<Attempt<C>, PoolError> {
        let mut waiters = self.waiters.lock();
        if self.is_disposed() {
            return Err(PoolError::PoolClosed);
        }
        if let Some(conn) = self.try_acquire()? {
            return Ok(Attempt::Ready(conn));
        }
        if self.is_disposed() {
            return Err(PoolError::PoolClosed);
        }

        let failures = self.acquire_failures.load(Ordering::Acquire);
        if failures >= self.config.max_acquire_retry_count {
            self.acquire_failures.store(0, Ordering::Release);
            self.metrics.lock().checkouts_failed += 1;
            tracing::warn!(
                parent: &self.span,
                attempts = failures,
                "no connection available"
            );
            return Err(PoolError::ConnectionUnavailable {
                endpoint: self.endpoint,
                attempts: failures,
            });
        }

        let waiter = Arc::new(Waiter::new());
        waiters.push_back(Arc::clone(&waiter));
        Ok(Attempt::Wait(waiter))
    }

    /// Account for a finished wait. Only a wait nobody completed counts as
    /// a failure; the waiter is completed so a later release skips it.
    fn after_wait(&self, waiter: &Waiter, signaled: bool) {
        if !signaled && waiter.try_complete() {
            let failures = self.acquire_failures.fetch_add(1, Ordering::AcqRel) + 1;
            self.metrics.lock().waits_timed_out += 1;
            tracing::debug!(
                parent: &self.span,
                failures,
                "timed out waiting for a connection"
            );
        }
    }

    fn acquire_blocking(&self) -> Result<Arc<C>, PoolError> {
        loop {
            let waiter = match self.attempt()? {
                Attempt::Ready(conn) => return Ok(conn),
                Attempt::Wait(waiter) => waiter,
            };
            let signaled = waiter.wait_blocking(self.config.wait_timeout);
            self.after_wait(&waiter, signaled);
        }
    }

    async fn acquire_async(&self) -> Result<Arc<C>, PoolError> {
        loop {
            let waiter = match self.attempt()? {
                Attempt::Ready(conn) => return Ok(conn),
                Attempt::Wait(waiter) => waiter,
            };
            let mut guard = AbandonGuard {
                pool: self,
                waiter: &waiter,
                armed: true,
            };
            let signaled = waiter.wait_async(self.config.wait_timeout).await;
            guard.armed = false;
            self.after_wait(&waiter, signaled);
        }
    }

    fn release(&self, conn: Arc<C>) {
        conn.mark_used(false);

        if conn.is_dead() {
            self.evict_dead(&conn);
        } else {
            let guard = self.create_lock.lock();
            if self.is_disposed() {
                self.destroy(&conn);
            } else {
                tracing::debug!(
                    parent: &self.span,
                    connection_id = %conn.id(),
                    "released connection"
                );
                self.idle.lock().push_back(conn);
            }
            drop(guard);
        }

        self.wake_next();
    }

    /// Close a dead connection and report it to the health sink.
    fn evict_dead(&self, conn: &Arc<C>) {
        let removed = {
            let _guard = self.create_lock.lock();
            self.destroy(conn)
        };
        if removed {
            self.metrics.lock().dead_connections += 1;
        }
        tracing::info!(
            parent: &self.span,
            connection_id = %conn.id(),
            count = self.live_count.load(Ordering::Acquire),
            "connection is dead"
        );
        self.health.connection_died(conn.is_dead());
    }

    /// Signal the oldest waiter that is still waiting.
    fn wake_next(&self) {
        let mut waiters = self.waiters.lock();
        while let Some(waiter) = waiters.pop_front() {
            if waiter.try_complete() {
                break;
            }
        }
    }

    fn dispose(&self) {
        {
            let _guard = self.create_lock.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
        }

        let conns: Vec<Arc<C>> = self.refs.lock().values().cloned().collect();
        for conn in conns {
            if conn.has_shutdown() {
                continue;
            }
            if conn.in_use() {
                tracing::debug!(
                    parent: &self.span,
                    connection_id = %conn.id(),
                    "connection in use, closing when idle"
                );
                conn.countdown_to_close(
                    self.config.close_attempt_interval,
                    self.config.max_close_attempts,
                );
            } else {
                let _guard = self.create_lock.lock();
                self.destroy(&conn);
            }
        }
        self.idle.lock().clear();

        for waiter in self.waiters.lock().drain(..) {
            waiter.try_complete();
        }

        tracing::info!(
            parent: &self.span,
            remaining = self.live_count.load(Ordering::Acquire),
            "connection pool disposed"
        );
    }
}

/// Completes the waiter of an async acquire dropped mid-wait.
///
/// A release that already picked the waiter loses its wakeup otherwise, so
/// in that case the wakeup is handed to the next waiter.
struct AbandonGuard<'a, C: Connection> {
    pool: &'a PoolInner<C>,
    waiter: &'a Waiter,
    armed: bool,
}

impl<C: Connection> Drop for AbandonGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed && !self.waiter.try_complete() {
            tracing::debug!(parent: &self.pool.span, "abandoned wait was signaled, waking next");
            self.pool.wake_next();
        }
    }
}

impl<C: Connection> Drop for PoolInner<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builder for creating a connection pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = ConnectionPool::builder()
///     .endpoint(addr)
///     .max_size(4)
///     .factory(connect)
///     .health(node)
///     .build()?;
/// ```
pub struct PoolBuilder<C: Connection> {
    endpoint: Option<SocketAddr>,
    pool_config: PoolConfig,
    factory: Option<ConnectionFactory<C>>,
    health: Option<Arc<dyn NodeHealth>>,
    span: Option<Span>,
    converter: ByteConverter,
}

impl<C: Connection> PoolBuilder<C> {
    /// Create a new pool builder with default settings.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            pool_config: PoolConfig::default(),
            factory: None,
            health: None,
            span: None,
            converter: ByteConverter::new(),
        }
    }

    /// Set the endpoint the pool serves.
    #[must_use]
    pub fn endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the minimum number of connections.
    #[must_use]
    pub fn min_size(mut self, count: usize) -> Self {
        self.pool_config.min_size = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_size(mut self, count: usize) -> Self {
        self.pool_config.max_size = count;
        self
    }

    /// Set the per-attempt wait timeout.
    #[must_use]
    pub fn wait_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.pool_config.wait_timeout = timeout;
        self
    }

    /// Set the connection factory.
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ConnectionContext) -> Result<C, PoolError> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Set the sink notified about dead connections.
    #[must_use]
    pub fn health(mut self, health: Arc<dyn NodeHealth>) -> Self {
        self.health = Some(health);
        self
    }

    /// Set the span pool events are logged under.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the byte converter handed to connections.
    #[must_use]
    pub fn converter(mut self, converter: ByteConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Build the pool.
    pub fn build(self) -> Result<ConnectionPool<C>, PoolError> {
        let config = self.pool_config;
        config.validate()?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| PoolError::Config("endpoint is required".into()))?;
        let factory = self
            .factory
            .ok_or_else(|| PoolError::Config("connection factory is required".into()))?;

        let pool_id = Uuid::new_v4();
        let span = self.span.unwrap_or_else(|| {
            tracing::info_span!("connection_pool", endpoint = %endpoint, pool_id = %pool_id)
        });
        let allocator = Arc::new(BufferAllocator::new(
            config.buffer_size,
            config.max_size * BUFFERS_PER_CONNECTION,
        ));

        let inner = Arc::new(PoolInner {
            config: config.clone(),
            endpoint,
            pool_id,
            span,
            factory,
            health: self.health.unwrap_or_else(|| Arc::new(NoopHealth)),
            converter: self.converter,
            allocator,
            idle: Mutex::new(VecDeque::with_capacity(config.max_size)),
            refs: Mutex::new(HashMap::with_capacity(config.max_size)),
            live_count: AtomicUsize::new(0),
            acquire_failures: AtomicU32::new(0),
            create_lock: Mutex::new(()),
            waiters: Mutex::new(VecDeque::new()),
            disposed: AtomicBool::new(false),
            initialization_failed: AtomicBool::new(false),
            next_connection_id: AtomicU64::new(1),
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
        });

        tracing::info!(
            parent: &inner.span,
            min = config.min_size,
            max = config.max_size,
            "connection pool created"
        );

        Ok(ConnectionPool { config, inner })
    }
}

impl<C: Connection> Default for PoolBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of idle connections available.
    pub available: usize,
    /// Number of connections currently in use.
    pub in_use: usize,
    /// Total number of connections.
    pub total: usize,
    /// Maximum allowed connections.
    pub max: usize,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.in_use as f64 / self.max as f64) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total connections created since pool start.
    pub connections_created: u64,
    /// Total connections closed since pool start.
    pub connections_closed: u64,
    /// Connections found dead on release.
    pub dead_connections: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed checkouts (retry bound reached or factory error).
    pub checkouts_failed: u64,
    /// Waits that ended without a release.
    pub waits_timed_out: u64,
    /// Time since pool creation.
    pub uptime: std::time::Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }

    /// Fraction of created connections that were found dead (0.0 to 1.0).
    #[must_use]
    pub fn dead_connection_rate(&self) -> f64 {
        if self.connections_created == 0 {
            return 0.0;
        }
        self.dead_connections as f64 / self.connections_created as f64
    }
}

/// A connection retrieved from the pool.
///
/// When dropped, the connection is automatically returned to the pool.
pub struct PooledConnection<C: Connection> {
    conn: Arc<C>,
    pool: Arc<PoolInner<C>>,
}

impl<C: Connection> PooledConnection<C> {
    fn new(conn: Arc<C>, pool: Arc<PoolInner<C>>) -> Self {
        Self { conn, pool }
    }

    /// Shared handle to the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }
}

impl<C: Connection> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C: Connection> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        tracing::trace!(
            parent: &self.pool.span,
            connection_id = %self.conn.id(),
            "returning connection to pool"
        );
        self.pool.release(Arc::clone(&self.conn));
    }
}

impl<C: Connection> fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.conn.id())
            .finish()
    }
}
