//! Contextual suppression gates.
//!
//! A gate is a named boolean condition that, while blocking, suppresses
//! squeeze handling. Each gate observes exactly one external condition
//! source (telephony, VR state, a proximity stream, dock state, or the
//! settings store) and notifies its listeners once per logical transition
//! of that condition.
//!
//! Registration doubles as activation: a gate taps its condition source
//! only while it has listeners, so the service turns the whole set on and
//! off by bulk (de)registration. Both directions are idempotent.

pub mod call;
pub mod pocket;
pub mod settings_gate;
pub mod tabletop;
pub mod vr;

use crate::gesture::GestureEvent;
use crate::platform::SubscriberId;
use std::sync::{Arc, Mutex};

// Re-export commonly used types
pub use call::{CallGate, CallState};
pub use pocket::{PocketGate, NEAR_THRESHOLD_CM};
pub use settings_gate::SettingsGate;
pub use tabletop::{DockState, TabletopGate};
pub use vr::VrGate;

/// Identity of a gate. Each kind appears at most once in a [`GateSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    Call,
    Vr,
    Pocket,
    Tabletop,
    Settings,
}

impl GateKind {
    pub fn label(&self) -> &'static str {
        match self {
            GateKind::Call => "call",
            GateKind::Vr => "vr",
            GateKind::Pocket => "pocket",
            GateKind::Tabletop => "tabletop",
            GateKind::Settings => "settings",
        }
    }
}

/// Callback invoked with the gate whose condition changed.
pub type GateListener = Arc<dyn Fn(GateKind) + Send + Sync>;

/// A contextual suppression condition.
pub trait Gate: Send + Sync {
    fn kind(&self) -> GateKind;

    /// Whether the observed condition currently suppresses squeezes.
    fn is_blocking(&self) -> bool;

    /// Attach a listener. The first registration activates the gate's tap
    /// on its condition source; re-registering an id replaces its callback.
    fn register_listener(&self, id: SubscriberId, listener: GateListener);

    /// Detach a listener; the gate goes idle once none remain. Unknown ids
    /// are a no-op.
    fn unregister_listener(&self, id: SubscriberId);

    /// Offer an in-flight gesture to the gate. Returning `true` consumes
    /// the event and suppresses action dispatch for it.
    fn handle_gesture(&self, event: &GestureEvent) -> bool {
        let _ = event;
        false
    }
}

/// Listener bookkeeping shared by all gate implementations.
pub(crate) struct GateCore {
    kind: GateKind,
    listeners: Mutex<Vec<(SubscriberId, GateListener)>>,
}

impl GateCore {
    pub(crate) fn new(kind: GateKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn register(&self, id: SubscriberId, listener: GateListener) {
        let mut listeners = self.listeners.lock().expect("gate listeners poisoned");
        if let Some(entry) = listeners.iter_mut().find(|(lid, _)| *lid == id) {
            entry.1 = listener;
        } else {
            listeners.push((id, listener));
        }
    }

    pub(crate) fn unregister(&self, id: SubscriberId) {
        let mut listeners = self.listeners.lock().expect("gate listeners poisoned");
        listeners.retain(|(lid, _)| *lid != id);
    }

    pub(crate) fn has_listeners(&self) -> bool {
        !self
            .listeners
            .lock()
            .expect("gate listeners poisoned")
            .is_empty()
    }

    pub(crate) fn notify_all(&self) {
        let listeners: Vec<GateListener> = {
            let listeners = self.listeners.lock().expect("gate listeners poisoned");
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(self.kind);
        }
    }
}

/// The set of gates owned by the service. One gate per kind; inserting a
/// kind again replaces the previous gate.
#[derive(Default)]
pub struct GateSet {
    gates: Vec<Box<dyn Gate>>,
}

impl GateSet {
    pub fn new() -> Self {
        Self { gates: Vec::new() }
    }

    pub fn insert(&mut self, gate: Box<dyn Gate>) {
        let kind = gate.kind();
        self.gates.retain(|g| g.kind() != kind);
        self.gates.push(gate);
    }

    pub fn get(&self, kind: GateKind) -> Option<&dyn Gate> {
        self.gates
            .iter()
            .find(|g| g.kind() == kind)
            .map(|g| g.as_ref())
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// First environmental gate currently blocking detection.
    ///
    /// The settings meta-gate is not consulted here: it suppresses action
    /// dispatch (see [`consume_gesture`]) rather than detection, so the
    /// tuning UI keeps receiving squeezes while it blocks.
    ///
    /// [`consume_gesture`]: GateSet::consume_gesture
    pub fn blocking_gate(&self) -> Option<GateKind> {
        self.gates
            .iter()
            .filter(|g| g.kind() != GateKind::Settings)
            .find(|g| g.is_blocking())
            .map(|g| g.kind())
    }

    /// Attach `listener` to every gate under one id (bulk activation).
    pub fn register_all(&self, id: SubscriberId, listener: GateListener) {
        for gate in &self.gates {
            gate.register_listener(id, listener.clone());
        }
    }

    /// Detach `id` from every gate (bulk deactivation).
    pub fn unregister_all(&self, id: SubscriberId) {
        for gate in &self.gates {
            gate.unregister_listener(id);
        }
    }

    /// Offer a gesture to consuming gates; `true` when one claimed it.
    pub fn consume_gesture(&self, event: &GestureEvent) -> bool {
        self.gates.iter().any(|g| g.handle_gesture(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TestGate {
        kind: GateKind,
        blocking: Arc<AtomicBool>,
        core: Arc<GateCore>,
    }

    impl TestGate {
        fn new(kind: GateKind) -> (Self, Arc<AtomicBool>) {
            let blocking = Arc::new(AtomicBool::new(false));
            let gate = Self {
                kind,
                blocking: blocking.clone(),
                core: GateCore::new(kind),
            };
            (gate, blocking)
        }
    }

    impl Gate for TestGate {
        fn kind(&self) -> GateKind {
            self.kind
        }

        fn is_blocking(&self) -> bool {
            self.blocking.load(Ordering::SeqCst)
        }

        fn register_listener(&self, id: SubscriberId, listener: GateListener) {
            self.core.register(id, listener);
        }

        fn unregister_listener(&self, id: SubscriberId) {
            self.core.unregister(id);
        }
    }

    #[test]
    fn test_insert_replaces_same_kind() {
        let mut set = GateSet::new();
        let (a, _) = TestGate::new(GateKind::Call);
        let (b, _) = TestGate::new(GateKind::Call);
        set.insert(Box::new(a));
        set.insert(Box::new(b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_blocking_gate_scans_environmental_gates() {
        let mut set = GateSet::new();
        let (call, call_blocking) = TestGate::new(GateKind::Call);
        let (vr, _) = TestGate::new(GateKind::Vr);
        set.insert(Box::new(call));
        set.insert(Box::new(vr));

        assert_eq!(set.blocking_gate(), None);
        call_blocking.store(true, Ordering::SeqCst);
        assert_eq!(set.blocking_gate(), Some(GateKind::Call));
    }

    #[test]
    fn test_settings_kind_never_blocks_detection() {
        let mut set = GateSet::new();
        let (settings, blocking) = TestGate::new(GateKind::Settings);
        set.insert(Box::new(settings));

        blocking.store(true, Ordering::SeqCst);
        assert_eq!(set.blocking_gate(), None);
    }

    #[test]
    fn test_bulk_registration_is_idempotent() {
        let mut set = GateSet::new();
        let (gate, _) = TestGate::new(GateKind::Vr);
        let core = gate.core.clone();
        set.insert(Box::new(gate));

        let id = SubscriberId::next();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let c = count.clone();
            set.register_all(
                id,
                Arc::new(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        core.notify_all();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        set.unregister_all(id);
        set.unregister_all(id);
        core.notify_all();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_gates_do_not_consume() {
        let mut set = GateSet::new();
        let (gate, blocking) = TestGate::new(GateKind::Call);
        set.insert(Box::new(gate));
        blocking.store(true, Ordering::SeqCst);

        let event = GestureEvent {
            timestamp: chrono::Utc::now(),
            confidence: 0.9,
        };
        assert!(!set.consume_gesture(&event));
    }
}
