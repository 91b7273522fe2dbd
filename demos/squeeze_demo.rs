//! Demonstration of the Gripsense Agent squeeze pipeline.
//!
//! This example shows how to:
//! 1. Build a controller over a scripted squeeze waveform
//! 2. Wire gates, actions and haptics into the gesture service
//! 3. Watch suppression kick in as the device context changes
//! 4. Consume squeezes for sensitivity tuning
//!
//! Run with: cargo run --example squeeze_demo
//!
//! The demo drives the condition monitors itself, so no real telephony,
//! proximity or dock integration is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use gripsense_agent::{
    action::{Action, ActionError, ActionRegistry},
    config::{Settings, SettingsStore},
    diagnostics::create_shared_log,
    gates::{CallGate, CallState, DockState, GateSet, PocketGate, SettingsGate, TabletopGate, VrGate},
    gesture::{GestureController, GestureModel},
    platform::{HapticDevice, ScreenState, StateMonitor, VibrationEffect},
    sensor::{source_for_device, SyntheticDevice},
    service::GestureService,
    AGENT_DECLARATION,
};

/// Prints instead of invoking a real system surface.
struct PrintAction;

impl Action for PrintAction {
    fn can_run(&self) -> bool {
        true
    }

    fn can_run_when_screen_off(&self) -> bool {
        true
    }

    fn run(&self) -> Result<(), ActionError> {
        println!("  >>> ACTION: assistant invoked");
        Ok(())
    }

    fn label(&self) -> &str {
        "demo-assistant"
    }
}

/// Prints each haptic pulse.
struct PrintHaptics;

impl HapticDevice for PrintHaptics {
    fn vibrate(&self, effect: &VibrationEffect) {
        println!("  * haptic pulse (amplitude {})", effect.amplitude);
    }
}

fn main() {
    println!("Gripsense Agent - Squeeze Demo");
    println!("==============================");
    println!();

    // Display behavior declaration
    println!("{AGENT_DECLARATION}");
    println!();

    // Settings live in memory for the demo; nothing touches disk.
    let mut initial = Settings::default();
    initial.action = "demo-assistant".to_string();
    let settings = Arc::new(SettingsStore::new(initial));

    // Condition monitors the scenario below will drive.
    let call = StateMonitor::shared(CallState::Idle);
    let vr = StateMonitor::shared(false);
    let proximity = StateMonitor::shared(100.0f32);
    let dock = StateMonitor::shared(DockState::Undocked);
    let screen = StateMonitor::shared(ScreenState::On);

    let mut gates = GateSet::new();
    gates.insert(Box::new(CallGate::new(call.clone())));
    gates.insert(Box::new(VrGate::new(vr.clone())));
    gates.insert(Box::new(PocketGate::new(proximity.clone())));
    gates.insert(Box::new(TabletopGate::new(dock.clone())));
    gates.insert(Box::new(SettingsGate::new(settings.clone())));

    let mut registry = ActionRegistry::with_builtin();
    registry.register("demo-assistant", Arc::new(PrintAction));

    // Scripted device: quiet grip noise with one squeeze burst per cycle.
    let device = Box::new(SyntheticDevice::squeeze_pattern());
    let controller = GestureController::new(source_for_device(device), GestureModel::builtin());

    let mut service = GestureService::new(
        settings.clone(),
        controller,
        gates,
        registry,
        Box::new(PrintHaptics),
        screen,
        create_shared_log(),
    );

    println!("Running for 16 seconds. Squeezes fire about every other second;");
    println!("watch them pause while the scenario blocks detection.");
    println!();

    // Set up stop flag
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    // Set up Ctrl+C handler
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    service.start();

    let start = Instant::now();
    let mut next_step = 0usize;

    while running.load(Ordering::SeqCst) && start.elapsed() < Duration::from_secs(16) {
        let elapsed = start.elapsed().as_secs();

        match (next_step, elapsed) {
            (0, e) if e >= 4 => {
                println!();
                println!("[scenario] incoming call - squeezes suppressed");
                call.set(CallState::Ringing);
                next_step = 1;
            }
            (1, e) if e >= 6 => {
                println!("[scenario] call ended - detection resumes");
                println!();
                call.set(CallState::Idle);
                next_step = 2;
            }
            (2, e) if e >= 8 => {
                println!();
                println!("[scenario] phone slides into a pocket");
                for _ in 0..3 {
                    proximity.feed(2.0);
                }
                next_step = 3;
            }
            (3, e) if e >= 10 => {
                println!("[scenario] phone comes back out");
                println!();
                proximity.feed(80.0);
                next_step = 4;
            }
            (4, e) if e >= 12 => {
                println!();
                println!("[scenario] settings UI starts sensitivity tuning");
                println!("[scenario] squeezes now give haptic feedback but run no action");
                settings.set_tuning_active(true);
                next_step = 5;
            }
            (5, e) if e >= 14 => {
                println!("[scenario] tuning finished");
                println!();
                settings.set_tuning_active(false);
                next_step = 6;
            }
            _ => {}
        }

        service.pump();
        thread::sleep(Duration::from_millis(10));
    }

    println!();
    println!("Stopping agent...");
    service.stop();

    // Final statistics
    println!();
    println!("{}", service.diagnostics().summary());
    println!();
    println!("Demo complete!");
}
