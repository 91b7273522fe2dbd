//! Gesture service: the arbitration core of the agent.
//!
//! Owns the controller, the gate set, the current action and the wake
//! lock, and recomputes one enabled/blocked decision whenever a gate,
//! setting or screen edge changes. All callbacks (gates, settings store,
//! screen monitor, controller) only enqueue onto a single event channel;
//! one consumer drains it, so no two recomputations ever interleave.
//!
//! Decision rule: while the feature is enabled the gates are activated and
//! the controller listens iff no environmental gate blocks. Disabling the
//! feature, or a screen-off edge while screen observation is active,
//! deactivates the gates and forces the controller idle.

use crate::action::{Action, ActionRegistry};
use crate::config::{sensitivity_from_raw, SettingKey, SharedSettingsStore};
use crate::diagnostics::SharedDiagnostics;
use crate::gates::{GateKind, GateSet};
use crate::gesture::{ControllerState, GestureController, GestureEvent};
use crate::platform::{
    HapticDevice, ScreenState, SharedMonitor, SubscriberId, VibrationEffect, WakeLock,
};
use crate::sensor::SensorSample;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bounded hold time for the gesture-handling wake lock.
const GESTURE_WAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// How often the settings file is polled for external edits.
const SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Samples drained per pump so one burst cannot starve event handling.
const MAX_SAMPLES_PER_PUMP: u64 = 256;

/// Everything the service reacts to, serialized onto one channel.
#[derive(Debug, Clone, Copy)]
pub enum ServiceEvent {
    /// A squeeze raised by the controller
    Gesture(GestureEvent),
    /// A gate's observed condition changed
    GateChanged(GateKind),
    /// A setting changed (external edit or write-back)
    SettingChanged(SettingKey),
    /// Screen on/off edge
    Screen(ScreenState),
    /// Stop the run loop
    Shutdown,
}

/// The arbitration core.
pub struct GestureService {
    settings: SharedSettingsStore,
    controller: GestureController,
    gates: GateSet,
    registry: ActionRegistry,
    action: Arc<dyn Action>,
    haptics: Box<dyn HapticDevice>,
    screen: SharedMonitor<ScreenState>,
    wake: Arc<WakeLock>,
    diagnostics: SharedDiagnostics,

    event_sender: Sender<ServiceEvent>,
    event_receiver: Receiver<ServiceEvent>,
    samples: Receiver<SensorSample>,

    gate_tap: SubscriberId,
    settings_tap: SubscriberId,
    screen_tap: SubscriberId,

    gates_active: bool,
    screen_observing: bool,
    /// Set by a screen-off edge; holds the controller idle until screen-on.
    screen_off_hold: bool,
}

impl GestureService {
    pub fn new(
        settings: SharedSettingsStore,
        controller: GestureController,
        gates: GateSet,
        registry: ActionRegistry,
        haptics: Box<dyn HapticDevice>,
        screen: SharedMonitor<ScreenState>,
        diagnostics: SharedDiagnostics,
    ) -> Self {
        let (event_sender, event_receiver) = bounded(10_000);
        let samples = controller.sample_receiver().clone();
        let action = registry.resolve(&settings.action_key());

        Self {
            settings,
            controller,
            gates,
            registry,
            action,
            haptics,
            screen,
            wake: Arc::new(WakeLock::new("gripsense:gesture")),
            diagnostics,
            event_sender,
            event_receiver,
            samples,
            gate_tap: SubscriberId::next(),
            settings_tap: SubscriberId::next(),
            screen_tap: SubscriberId::next(),
            gates_active: false,
            screen_observing: false,
            screen_off_hold: false,
        }
    }

    /// Sender half of the service channel, for platform integrations and
    /// shutdown requests.
    pub fn event_sender(&self) -> Sender<ServiceEvent> {
        self.event_sender.clone()
    }

    pub fn settings(&self) -> &SharedSettingsStore {
        &self.settings
    }

    pub fn diagnostics(&self) -> &SharedDiagnostics {
        &self.diagnostics
    }

    /// The wake lock used during gesture handling.
    pub fn wake_lock(&self) -> &Arc<WakeLock> {
        &self.wake
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn is_screen_observing(&self) -> bool {
        self.screen_observing
    }

    pub fn current_action_label(&self) -> String {
        self.action.label().to_string()
    }

    /// Wire all listeners and compute the initial decision.
    pub fn start(&mut self) {
        let sender = self.event_sender.clone();
        self.controller.set_listener(Box::new(move |event| {
            let _ = sender.try_send(ServiceEvent::Gesture(*event));
        }));

        let sender = self.event_sender.clone();
        self.settings.register_listener(
            self.settings_tap,
            Arc::new(move |key| {
                let _ = sender.try_send(ServiceEvent::SettingChanged(key));
            }),
        );

        self.controller
            .update_sensitivity(sensitivity_from_raw(self.settings.sensitivity()));
        self.refresh_action();
        self.refresh_screen_observation();
        self.update_enabled();
    }

    /// Tear down listeners and stop the controller.
    pub fn stop(&mut self) {
        self.deactivate_gates();
        self.controller.stop_listening();
        self.controller.clear_listener();
        self.settings.unregister_listener(self.settings_tap);
        if self.screen_observing {
            self.screen.unsubscribe(self.screen_tap);
            self.screen_observing = false;
        }
        if let Err(e) = self.diagnostics.save() {
            tracing::warn!("could not persist diagnostics: {e}");
        }
    }

    /// Single recomputation point for the enabled/blocked decision.
    pub fn update_enabled(&mut self) {
        if !self.settings.enabled() {
            self.deactivate_gates();
            self.controller.stop_listening();
            return;
        }

        if self.screen_off_hold {
            // Power hold: everything stays down until the screen-on edge.
            self.deactivate_gates();
            self.controller.stop_listening();
            return;
        }

        self.activate_gates();

        match self.gates.blocking_gate() {
            Some(kind) => {
                tracing::debug!("detection suppressed by {} gate", kind.label());
                self.controller.stop_listening();
            }
            None => self.controller.start_listening(),
        }
    }

    /// Handle one queued event.
    pub fn handle_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::Gesture(e) => self.on_gesture_detected(e),
            ServiceEvent::GateChanged(kind) => self.on_gate_changed(kind),
            ServiceEvent::SettingChanged(key) => self.on_setting_changed(key),
            ServiceEvent::Screen(state) => self.on_screen_event(state),
            ServiceEvent::Shutdown => {}
        }
    }

    /// Drain queued events, then a bounded number of pending samples.
    /// Returns false once a shutdown request is seen.
    pub fn pump(&mut self) -> bool {
        while let Ok(event) = self.event_receiver.try_recv() {
            if matches!(event, ServiceEvent::Shutdown) {
                return false;
            }
            self.handle_event(event);
        }

        let mut processed = 0u64;
        while processed < MAX_SAMPLES_PER_PUMP {
            match self.samples.try_recv() {
                Ok(sample) => {
                    self.controller.handle_sample(sample);
                    processed += 1;
                }
                Err(_) => break,
            }
        }
        if processed > 0 {
            self.diagnostics.record_samples(processed);
        }
        true
    }

    /// Run until `running` clears or a shutdown event arrives.
    pub fn run(&mut self, running: Arc<AtomicBool>) {
        let samples = self.samples.clone();
        let events = self.event_receiver.clone();
        let mut last_settings_poll = Instant::now();

        while running.load(Ordering::SeqCst) {
            // Poll the settings file so `gripsense enable/disable/set`
            // can control a running agent from another process.
            if last_settings_poll.elapsed() >= SETTINGS_POLL_INTERVAL {
                self.settings.reload_from_disk();
                last_settings_poll = Instant::now();
            }

            if !self.pump() {
                break;
            }

            select! {
                recv(samples) -> sample => {
                    if let Ok(sample) = sample {
                        self.controller.handle_sample(sample);
                        self.diagnostics.record_samples(1);
                    }
                }
                recv(events) -> event => {
                    match event {
                        Ok(ServiceEvent::Shutdown) | Err(_) => break,
                        Ok(event) => self.handle_event(event),
                    }
                }
                default(Duration::from_millis(100)) => {}
            }
        }

        self.stop();
    }

    fn on_gate_changed(&mut self, kind: GateKind) {
        tracing::debug!("gate changed: {}", kind.label());
        if self.settings.enabled() {
            self.update_enabled();
        }
    }

    fn on_setting_changed(&mut self, key: SettingKey) {
        match key {
            SettingKey::Enabled => self.update_enabled(),
            SettingKey::Sensitivity => {
                let sensitivity = sensitivity_from_raw(self.settings.sensitivity());
                self.controller.update_sensitivity(sensitivity);
            }
            SettingKey::Action => {
                self.refresh_action();
                self.refresh_screen_observation();
            }
            SettingKey::AllowScreenOff => self.refresh_screen_observation(),
            // Haptic strength is read at dispatch time; tuning is the
            // settings gate's concern; the last key is our own write-back.
            SettingKey::HapticIntensity
            | SettingKey::TuningActive
            | SettingKey::ActionRequiresScreenOn => {}
        }
    }

    fn on_screen_event(&mut self, state: ScreenState) {
        // Edges queued before an unsubscribe are stale.
        if !self.screen_observing {
            return;
        }

        match state {
            ScreenState::Off => {
                self.screen_off_hold = true;
                if self.settings.enabled() {
                    tracing::debug!("screen off, suspending gesture detection");
                    self.deactivate_gates();
                    self.controller.stop_listening();
                }
            }
            ScreenState::On => {
                self.screen_off_hold = false;
                self.update_enabled();
            }
        }
    }

    /// Dispatch one confirmed squeeze: wake lock, runnability check,
    /// haptic, settings-gate consumption, action run. The wake guard
    /// covers every exit path.
    fn on_gesture_detected(&mut self, event: GestureEvent) {
        self.diagnostics.record_detected();

        // Events that raced past a stop are dropped before any side effect.
        if self.controller.state() != ControllerState::Listening {
            self.diagnostics.record_suppressed();
            return;
        }

        // One clone per dispatch: a concurrent-looking action swap can
        // never split one event across two instances.
        let action = self.action.clone();

        let _wake = self.wake.acquire_scoped(GESTURE_WAKE_TIMEOUT);
        self.diagnostics.record_wake_acquisition();

        if !action.can_run() {
            self.diagnostics.record_suppressed();
            return;
        }

        if let Some(effect) = VibrationEffect::for_intensity(self.settings.haptic_intensity()) {
            self.haptics.vibrate(&effect);
        }

        if self.gates.consume_gesture(&event) {
            self.diagnostics.record_consumed();
            return;
        }

        match action.run() {
            Ok(()) => {
                self.diagnostics.record_dispatched();
                tracing::info!(
                    "squeeze dispatched to '{}' (confidence {:.2})",
                    action.label(),
                    event.confidence
                );
            }
            Err(e) => {
                // A misbehaving action must not take the agent down.
                self.diagnostics.record_action_failure();
                tracing::warn!("action '{}' failed: {e}", action.label());
            }
        }
    }

    fn refresh_action(&mut self) {
        let key = self.settings.action_key();
        self.action = self.registry.resolve(&key);
        tracing::info!("active action: {}", self.action.label());

        // Write back the one derived flag the agent owns: whether the
        // selected action forces screen-on operation.
        let requires_screen = !self.action.can_run_when_screen_off();
        if requires_screen != self.settings.action_requires_screen_on() {
            self.settings.set_action_requires_screen_on(requires_screen);
            if let Err(e) = self.settings.save() {
                tracing::warn!("could not persist derived screen flag: {e}");
            }
        }
    }

    /// Subscribe to screen edges only while required: either the user has
    /// not allowed screen-off operation, or the selected action cannot run
    /// with the screen off. At most one (un)subscribe per transition.
    fn refresh_screen_observation(&mut self) {
        let required =
            !self.settings.allow_screen_off() || !self.action.can_run_when_screen_off();

        if required && !self.screen_observing {
            let sender = self.event_sender.clone();
            self.screen.subscribe(
                self.screen_tap,
                Arc::new(move |state| {
                    let _ = sender.try_send(ServiceEvent::Screen(state));
                }),
            );
            self.screen_observing = true;

            // The screen may already be off when observation begins.
            if self.screen.get() == ScreenState::Off {
                self.on_screen_event(ScreenState::Off);
            }
        } else if !required && self.screen_observing {
            self.screen.unsubscribe(self.screen_tap);
            self.screen_observing = false;

            // Without observation there is no power hold either.
            if self.screen_off_hold {
                self.screen_off_hold = false;
                self.update_enabled();
            }
        }
    }

    fn activate_gates(&mut self) {
        if self.gates_active {
            return;
        }
        let sender = self.event_sender.clone();
        self.gates.register_all(
            self.gate_tap,
            Arc::new(move |kind| {
                let _ = sender.try_send(ServiceEvent::GateChanged(kind));
            }),
        );
        self.gates_active = true;
    }

    fn deactivate_gates(&mut self) {
        if !self.gates_active {
            return;
        }
        self.gates.unregister_all(self.gate_tap);
        self.gates_active = false;
    }
}

impl Drop for GestureService {
    fn drop(&mut self) {
        self.stop();
    }
}
