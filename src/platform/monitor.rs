//! Observable device-state monitors.
//!
//! A [`StateMonitor`] holds one piece of externally-driven device state
//! (screen on/off, telephony state, dock state) and fans each change out to
//! subscribed callbacks. Platform integration code feeds monitors via
//! [`StateMonitor::set`]; in tests they are driven directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Process-unique identity for listener registrations.
///
/// Registration and removal are keyed by id so both are idempotent:
/// re-registering replaces the callback, removing twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Screen power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    On,
    Off,
}

impl ScreenState {
    pub fn is_on(&self) -> bool {
        matches!(self, ScreenState::On)
    }
}

/// Callback invoked with the new state after a change.
pub type StateCallback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Observable cell of device state.
///
/// Subscribers are notified only on actual changes; setting the current
/// value again is silent. Subscription management mirrors the settings
/// store: same-id registration replaces, removal of an unknown id is a
/// no-op.
pub struct StateMonitor<T> {
    state: Mutex<T>,
    subscribers: Mutex<Vec<(SubscriberId, StateCallback<T>)>>,
}

/// Shared handle to a monitor.
pub type SharedMonitor<T> = Arc<StateMonitor<T>>;

impl<T: Clone + PartialEq> StateMonitor<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Create a shared monitor.
    pub fn shared(initial: T) -> SharedMonitor<T> {
        Arc::new(Self::new(initial))
    }

    /// Current state (cloned).
    pub fn get(&self) -> T {
        self.state.lock().expect("monitor state poisoned").clone()
    }

    /// Update the state, notifying subscribers when the value changed.
    pub fn set(&self, value: T) {
        let changed = {
            let mut state = self.state.lock().expect("monitor state poisoned");
            if *state == value {
                false
            } else {
                *state = value.clone();
                true
            }
        };

        if changed {
            let subscribers: Vec<StateCallback<T>> = {
                let subs = self.subscribers.lock().expect("monitor subscribers poisoned");
                subs.iter().map(|(_, cb)| cb.clone()).collect()
            };
            for callback in subscribers {
                callback(value.clone());
            }
        }
    }

    /// Push a reading through the monitor, notifying subscribers even when
    /// the value repeats. For stream-like sources (proximity readings)
    /// where every delivery matters; [`set`] is for edge-like state.
    ///
    /// [`set`]: StateMonitor::set
    pub fn feed(&self, value: T) {
        {
            let mut state = self.state.lock().expect("monitor state poisoned");
            *state = value.clone();
        }
        let subscribers: Vec<StateCallback<T>> = {
            let subs = self.subscribers.lock().expect("monitor subscribers poisoned");
            subs.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in subscribers {
            callback(value.clone());
        }
    }

    /// Subscribe a callback. Re-subscribing the same id replaces the
    /// previous callback instead of adding a second one.
    pub fn subscribe(&self, id: SubscriberId, callback: StateCallback<T>) {
        let mut subs = self.subscribers.lock().expect("monitor subscribers poisoned");
        if let Some(entry) = subs.iter_mut().find(|(sid, _)| *sid == id) {
            entry.1 = callback;
        } else {
            subs.push((id, callback));
        }
    }

    /// Remove a subscription. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.subscribers.lock().expect("monitor subscribers poisoned");
        subs.retain(|(sid, _)| *sid != id);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("monitor subscribers poisoned")
            .len()
    }
}
