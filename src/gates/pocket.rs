//! Pocket/enclosure gate.
//!
//! Classifies a proximity reading stream: several consecutive near
//! readings mean the device is pocketed or otherwise enclosed and grip
//! pressure is noise; a single far reading clears the classification.
//! Readings arrive via [`StateMonitor::feed`] so repeats are delivered.
//!
//! [`StateMonitor::feed`]: crate::platform::StateMonitor::feed

use crate::gates::{Gate, GateCore, GateKind, GateListener};
use crate::platform::{SharedMonitor, SubscriberId};
use std::sync::{Arc, Mutex};

/// Proximity below this distance counts as "near".
pub const NEAR_THRESHOLD_CM: f32 = 5.0;

/// Consecutive near readings before the gate blocks.
const POCKET_ENTRY_READINGS: u32 = 3;

#[derive(Default)]
struct PocketInner {
    consecutive_near: u32,
    pocketed: bool,
}

/// Blocks squeezes while the device reads as enclosed.
pub struct PocketGate {
    core: Arc<GateCore>,
    monitor: SharedMonitor<f32>,
    inner: Arc<Mutex<PocketInner>>,
    tap: SubscriberId,
}

impl PocketGate {
    pub fn new(monitor: SharedMonitor<f32>) -> Self {
        Self {
            core: GateCore::new(GateKind::Pocket),
            monitor,
            inner: Arc::new(Mutex::new(PocketInner::default())),
            tap: SubscriberId::next(),
        }
    }
}

impl Gate for PocketGate {
    fn kind(&self) -> GateKind {
        GateKind::Pocket
    }

    fn is_blocking(&self) -> bool {
        self.inner.lock().expect("pocket state poisoned").pocketed
    }

    fn register_listener(&self, id: SubscriberId, listener: GateListener) {
        self.core.register(id, listener);

        let core = self.core.clone();
        let inner = self.inner.clone();
        self.monitor.subscribe(
            self.tap,
            Arc::new(move |distance_cm: f32| {
                let flipped = {
                    let mut inner = inner.lock().expect("pocket state poisoned");
                    let was = inner.pocketed;
                    if distance_cm < NEAR_THRESHOLD_CM {
                        inner.consecutive_near += 1;
                        if inner.consecutive_near >= POCKET_ENTRY_READINGS {
                            inner.pocketed = true;
                        }
                    } else {
                        inner.consecutive_near = 0;
                        inner.pocketed = false;
                    }
                    was != inner.pocketed
                };
                // Per-reading churn stays internal; listeners only hear
                // pocketed/unpocketed transitions.
                if flipped {
                    core.notify_all();
                }
            }),
        );
    }

    fn unregister_listener(&self, id: SubscriberId) {
        self.core.unregister(id);
        if !self.core.has_listeners() {
            self.monitor.unsubscribe(self.tap);
            // Idle gates must not block on reactivation with stale state.
            *self.inner.lock().expect("pocket state poisoned") = PocketInner::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StateMonitor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn active_gate() -> (PocketGate, SharedMonitor<f32>, Arc<AtomicUsize>) {
        let monitor = StateMonitor::shared(100.0f32);
        let gate = PocketGate::new(monitor.clone());
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        gate.register_listener(
            SubscriberId::next(),
            Arc::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (gate, monitor, count)
    }

    #[test]
    fn test_blocks_after_consecutive_near_readings() {
        let (gate, monitor, notifications) = active_gate();

        monitor.feed(2.0);
        monitor.feed(2.0);
        assert!(!gate.is_blocking());

        monitor.feed(2.0);
        assert!(gate.is_blocking());
        // One notification for the pocketed transition, not one per reading.
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_single_far_reading_clears() {
        let (gate, monitor, notifications) = active_gate();

        for _ in 0..5 {
            monitor.feed(1.0);
        }
        assert!(gate.is_blocking());

        monitor.feed(50.0);
        assert!(!gate.is_blocking());
        assert_eq!(notifications.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_interrupted_near_run_does_not_block() {
        let (gate, monitor, _) = active_gate();

        monitor.feed(2.0);
        monitor.feed(2.0);
        monitor.feed(50.0);
        monitor.feed(2.0);
        monitor.feed(2.0);
        assert!(!gate.is_blocking());
    }

    #[test]
    fn test_deactivation_resets_classification() {
        let monitor = StateMonitor::shared(100.0f32);
        let gate = PocketGate::new(monitor.clone());
        let id = SubscriberId::next();
        gate.register_listener(id, Arc::new(|_| {}));

        for _ in 0..3 {
            monitor.feed(1.0);
        }
        assert!(gate.is_blocking());

        gate.unregister_listener(id);
        assert!(!gate.is_blocking());
        assert_eq!(monitor.subscriber_count(), 0);
    }
}
