//! One-shot wakeup for callers waiting on a connection.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;

/// A signal that can be completed exactly once.
///
/// Both blocking and async callers can wait on it. A completion that
/// happens before the wait starts is not lost.
#[derive(Debug, Default)]
pub struct Waiter {
    completed: Mutex<bool>,
    condvar: Condvar,
    notify: Notify,
}

impl Waiter {
    /// Create an uncompleted waiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the waiter.
    ///
    /// Returns `false` if it was already completed.
    pub fn try_complete(&self) -> bool {
        let mut completed = self.completed.lock();
        if *completed {
            return false;
        }
        *completed = true;
        drop(completed);

        self.condvar.notify_all();
        self.notify.notify_one();
        true
    }

    /// Whether the waiter has been completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        *self.completed.lock()
    }

    /// Block the current thread until completion or `timeout`.
    ///
    /// Returns whether the waiter was completed.
    pub fn wait_blocking(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut completed = self.completed.lock();
        while !*completed {
            if self.condvar.wait_until(&mut completed, deadline).timed_out() {
                break;
            }
        }
        *completed
    }

    /// Wait without blocking the thread until completion or `timeout`.
    ///
    /// Returns whether the waiter was completed.
    pub async fn wait_async(&self, timeout: Duration) -> bool {
        if self.is_completed() {
            return true;
        }
        match tokio::time::timeout(timeout, self.notify.notified()).await {
            Ok(()) => true,
            Err(_) => self.is_completed(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_second_completion_fails() {
        let waiter = Waiter::new();
        assert!(!waiter.is_completed());
        assert!(waiter.try_complete());
        assert!(!waiter.try_complete());
        assert!(waiter.is_completed());
    }

    #[test]
    fn test_blocking_wait_times_out() {
        let waiter = Waiter::new();
        let started = Instant::now();
        assert!(!waiter.wait_blocking(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_blocking_wait_is_woken() {
        let waiter = Arc::new(Waiter::new());
        let signaller = Arc::clone(&waiter);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            signaller.try_complete()
        });
        assert!(waiter.wait_blocking(Duration::from_secs(5)));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_completion_before_wait_is_kept() {
        let waiter = Waiter::new();
        waiter.try_complete();
        assert!(waiter.wait_blocking(Duration::from_millis(1)));
    }

    #[tokio::test]
    async fn test_async_wait_is_woken() {
        let waiter = Arc::new(Waiter::new());
        let signaller = Arc::clone(&waiter);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signaller.try_complete();
        });
        assert!(waiter.wait_async(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_async_wait_times_out() {
        let waiter = Waiter::new();
        assert!(!waiter.wait_async(Duration::from_millis(10)).await);
    }
}
