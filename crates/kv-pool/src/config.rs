//! Pool configuration.

use std::time::Duration;

use crate::error::PoolError;

/// Configuration for a connection pool.
///
/// Durations in the options string are milliseconds:
///
/// ```
/// use kv_driver_pool::PoolConfig;
///
/// let config = PoolConfig::from_options("MinSize=2;MaxSize=5;WaitTimeout=100").unwrap();
/// assert_eq!(config.max_size, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Connections created eagerly by `initialize`.
    pub min_size: usize,
    /// Upper bound on live connections.
    pub max_size: usize,
    /// How long one acquire attempt waits for a released connection.
    pub wait_timeout: Duration,
    /// Timed-out waits tolerated before acquire fails.
    pub max_acquire_retry_count: u32,
    /// Interval between close attempts on a connection still in use.
    pub close_attempt_interval: Duration,
    /// Close attempts before a busy connection is closed anyway.
    pub max_close_attempts: u32,
    /// Send timeout handed to connections.
    pub send_timeout: Duration,
    /// Connect timeout handed to connections.
    pub connect_timeout: Duration,
    /// Shutdown timeout handed to connections.
    pub shutdown_timeout: Duration,
    /// Size of buffers handed out by the allocator.
    pub buffer_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 2,
            wait_timeout: Duration::from_millis(2500),
            max_acquire_retry_count: 5,
            close_attempt_interval: Duration::from_millis(100),
            max_close_attempts: 5,
            send_timeout: Duration::from_millis(15000),
            connect_timeout: Duration::from_millis(10000),
            shutdown_timeout: Duration::from_millis(10000),
            buffer_size: 16 * 1024,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum pool size.
    #[must_use]
    pub fn min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    /// Set the maximum pool size.
    #[must_use]
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set the per-attempt wait timeout.
    #[must_use]
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the number of timed-out waits tolerated by acquire.
    #[must_use]
    pub fn max_acquire_retry_count(mut self, count: u32) -> Self {
        self.max_acquire_retry_count = count;
        self
    }

    /// Set the interval between close attempts on a busy connection.
    #[must_use]
    pub fn close_attempt_interval(mut self, interval: Duration) -> Self {
        self.close_attempt_interval = interval;
        self
    }

    /// Set the close attempts granted to a busy connection on dispose.
    #[must_use]
    pub fn max_close_attempts(mut self, attempts: u32) -> Self {
        self.max_close_attempts = attempts;
        self
    }

    /// Set the allocator buffer size.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_size == 0 {
            return Err(PoolError::Config("max_size must be at least 1".into()));
        }
        if self.min_size > self.max_size {
            return Err(PoolError::Config(format!(
                "min_size ({}) exceeds max_size ({})",
                self.min_size, self.max_size
            )));
        }
        if self.max_acquire_retry_count == 0 {
            return Err(PoolError::Config(
                "max_acquire_retry_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse a `Key=Value;Key=Value` options string over the defaults.
    ///
    /// Keys are case-insensitive. Unknown keys are ignored.
    pub fn from_options(options: &str) -> Result<Self, PoolError> {
        let mut config = Self::default();

        for part in options.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| PoolError::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "minsize" | "min size" => config.min_size = parse_number(&key, value)?,
                "maxsize" | "max size" => config.max_size = parse_number(&key, value)?,
                "waittimeout" | "wait timeout" => {
                    config.wait_timeout = parse_millis(&key, value)?;
                }
                "maxacquireretrycount" => {
                    config.max_acquire_retry_count = parse_number(&key, value)?;
                }
                "closeattemptinterval" => {
                    config.close_attempt_interval = parse_millis(&key, value)?;
                }
                "maxcloseattempts" => config.max_close_attempts = parse_number(&key, value)?,
                "sendtimeout" => config.send_timeout = parse_millis(&key, value)?,
                "connecttimeout" | "connect timeout" => {
                    config.connect_timeout = parse_millis(&key, value)?;
                }
                "shutdowntimeout" => config.shutdown_timeout = parse_millis(&key, value)?,
                "buffersize" => config.buffer_size = parse_number(&key, value)?,
                _ => {
                    tracing::debug!(key = key, value = value, "ignoring unknown pool option");
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, PoolError> {
    value
        .parse()
        .map_err(|_| PoolError::Config(format!("invalid value for {key}: {value}")))
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, PoolError> {
    parse_number::<u64>(key, value).map(Duration::from_millis)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.min_size, 1);
        assert_eq!(config.max_size, 2);
        assert_eq!(config.wait_timeout, Duration::from_millis(2500));
        assert_eq!(config.max_acquire_retry_count, 5);
        assert_eq!(config.buffer_size, 16 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_options() {
        let config = PoolConfig::from_options(
            "MinSize=2; MaxSize=5;WaitTimeout=100;MaxAcquireRetryCount=3;CloseAttemptInterval=50",
        )
        .unwrap();
        assert_eq!(config.min_size, 2);
        assert_eq!(config.max_size, 5);
        assert_eq!(config.wait_timeout, Duration::from_millis(100));
        assert_eq!(config.max_acquire_retry_count, 3);
        assert_eq!(config.close_attempt_interval, Duration::from_millis(50));

        let config = PoolConfig::from_options("MaxCloseAttempts=9").unwrap();
        assert_eq!(config.max_close_attempts, 9);
    }

    #[test]
    fn test_from_options_ignores_unknown_keys() {
        let config = PoolConfig::from_options("maxsize=4;Flavor=vanilla").unwrap();
        assert_eq!(config.max_size, 4);
    }

    #[test]
    fn test_from_options_rejects_bad_values() {
        assert!(PoolConfig::from_options("MaxSize=lots").is_err());
        assert!(PoolConfig::from_options("MaxSize").is_err());
        assert!(PoolConfig::from_options("MinSize=3;MaxSize=2").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(PoolConfig::new().max_size(0).validate().is_err());
        assert!(PoolConfig::new().max_acquire_retry_count(0).validate().is_err());
        assert!(PoolConfig::new().min_size(2).max_size(2).validate().is_ok());
    }
}
