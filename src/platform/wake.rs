//! Wake lock for the gesture-handling critical section.
//!
//! Modeled on a timed platform wake lock: every acquisition carries a hold
//! timeout after which the lock lapses on its own, so a lost release can
//! never pin the device awake. [`WakeLockGuard`] ties the release to scope
//! exit, covering early returns and action failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Timed exclusive wake resource.
pub struct WakeLock {
    tag: String,
    deadline: Mutex<Option<Instant>>,
    acquisitions: AtomicU64,
}

impl WakeLock {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            deadline: Mutex::new(None),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Acquire the lock for at most `timeout`. A second acquire while held
    /// replaces the deadline rather than stacking.
    pub fn acquire(&self, timeout: Duration) {
        let mut deadline = self.deadline.lock().expect("wake lock poisoned");
        *deadline = Some(Instant::now() + timeout);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("wake lock '{}' acquired for {:?}", self.tag, timeout);
    }

    /// Release the lock. Releasing an unheld lock is a no-op.
    pub fn release(&self) {
        let mut deadline = self.deadline.lock().expect("wake lock poisoned");
        if deadline.take().is_some() {
            tracing::debug!("wake lock '{}' released", self.tag);
        }
    }

    /// Whether the lock is currently held. An expired hold reads as
    /// released.
    pub fn is_held(&self) -> bool {
        let mut deadline = self.deadline.lock().expect("wake lock poisoned");
        match *deadline {
            Some(d) if Instant::now() < d => true,
            Some(_) => {
                // Lapsed; clear so a later release logs nothing.
                *deadline = None;
                false
            }
            None => false,
        }
    }

    /// Total number of acquisitions since creation.
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Acquire and return a guard that releases when dropped.
    pub fn acquire_scoped(self: &Arc<Self>, timeout: Duration) -> WakeLockGuard {
        self.acquire(timeout);
        WakeLockGuard { lock: self.clone() }
    }
}

/// Scope guard for a held [`WakeLock`].
pub struct WakeLockGuard {
    lock: Arc<WakeLock>,
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_release() {
        let lock = WakeLock::new("test");
        assert!(!lock.is_held());

        lock.acquire(Duration::from_secs(5));
        assert!(lock.is_held());

        lock.release();
        assert!(!lock.is_held());

        // Idempotent release
        lock.release();
        assert!(!lock.is_held());
        assert_eq!(lock.acquisition_count(), 1);
    }

    #[test]
    fn test_hold_expires() {
        let lock = WakeLock::new("test");
        lock.acquire(Duration::from_millis(5));
        assert!(lock.is_held());

        thread::sleep(Duration::from_millis(20));
        assert!(!lock.is_held());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = Arc::new(WakeLock::new("test"));
        {
            let _guard = lock.acquire_scoped(Duration::from_secs(5));
            assert!(lock.is_held());
        }
        assert!(!lock.is_held());
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let lock = Arc::new(WakeLock::new("test"));
        let inner = lock.clone();

        let result = std::panic::catch_unwind(move || {
            let _guard = inner.acquire_scoped(Duration::from_secs(5));
            panic!("action failed");
        });

        assert!(result.is_err());
        assert!(!lock.is_held());
    }
}
