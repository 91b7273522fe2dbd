//! Settings meta-gate.
//!
//! Unlike the environmental gates this one observes the persisted settings
//! store, and it suppresses dispatch rather than detection: while the user
//! is live-tuning sensitivity in the settings UI, squeezes keep being
//! detected but are consumed here to drive the tuning feedback instead of
//! running the configured action.

use crate::config::{SettingKey, SharedSettingsStore};
use crate::gates::{Gate, GateCore, GateKind, GateListener};
use crate::gesture::GestureEvent;
use crate::platform::SubscriberId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct SettingsGate {
    core: Arc<GateCore>,
    store: SharedSettingsStore,
    tap: SubscriberId,
    consumed: AtomicU64,
}

impl SettingsGate {
    pub fn new(store: SharedSettingsStore) -> Self {
        Self {
            core: GateCore::new(GateKind::Settings),
            store,
            tap: SubscriberId::next(),
            consumed: AtomicU64::new(0),
        }
    }

    /// Squeezes consumed for tuning so far.
    pub fn consumed_count(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed)
    }
}

impl Gate for SettingsGate {
    fn kind(&self) -> GateKind {
        GateKind::Settings
    }

    fn is_blocking(&self) -> bool {
        self.store.tuning_active()
    }

    fn register_listener(&self, id: SubscriberId, listener: GateListener) {
        self.core.register(id, listener);
        let core = self.core.clone();
        self.store.register_listener(
            self.tap,
            Arc::new(move |key| {
                if key == SettingKey::TuningActive {
                    core.notify_all();
                }
            }),
        );
    }

    fn unregister_listener(&self, id: SubscriberId) {
        self.core.unregister(id);
        if !self.core.has_listeners() {
            self.store.unregister_listener(self.tap);
        }
    }

    fn handle_gesture(&self, event: &GestureEvent) -> bool {
        if !self.is_blocking() {
            return false;
        }
        self.consumed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "squeeze consumed for tuning (confidence {:.3})",
            event.confidence
        );
        true
    }
}
