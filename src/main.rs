//! Gripsense Agent CLI
//!
//! Squeeze-gesture detection and dispatch for handheld devices.

use clap::{Parser, Subcommand};
use gripsense_agent::{
    action::ActionRegistry,
    config::{sensitivity_from_raw, HapticIntensity, Settings, SettingsStore},
    diagnostics::{agent_instance_id, create_shared_log_with_persistence, DiagnosticsLog},
    gates::{CallGate, CallState, DockState, GateSet, PocketGate, SettingsGate, TabletopGate, VrGate},
    gesture::{GestureController, GestureModel, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_GAP_MS},
    platform::{LogHaptics, ScreenState, StateMonitor},
    sensor::{source_for_device, SensorDevice, SyntheticDevice, DEFAULT_CADENCE},
    service::GestureService,
    AGENT_DECLARATION, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gripsense")]
#[command(author = "Gripsense")]
#[command(version = VERSION)]
#[command(about = "Squeeze-gesture detection and dispatch agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gesture agent
    Run {
        /// Waveform script for the synthetic sensor (JSON array of magnitudes)
        #[arg(long)]
        waveform: Option<PathBuf>,

        /// Treat the sensor as coprocessor-backed (batched low-power acquisition)
        #[arg(long)]
        low_power: bool,

        /// Classifier model spec (JSON); bundled model when omitted
        #[arg(long)]
        model: Option<PathBuf>,

        /// Detection confidence threshold
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
        threshold: f32,

        /// Minimum milliseconds between successive detections
        #[arg(long, default_value_t = DEFAULT_MIN_GAP_MS)]
        min_gap_ms: i64,
    },

    /// Enable gesture detection
    Enable,

    /// Disable gesture detection
    Disable,

    /// Change a setting (sensitivity, action, haptics, allow-screen-off, tuning)
    Set {
        /// Setting key
        key: String,

        /// New value
        value: String,
    },

    /// Show current agent status
    Status,

    /// Display behavior declaration
    About,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            waveform,
            low_power,
            model,
            threshold,
            min_gap_ms,
        } => {
            cmd_run(waveform, low_power, model, threshold, min_gap_ms);
        }
        Commands::Enable => {
            cmd_enable();
        }
        Commands::Disable => {
            cmd_disable();
        }
        Commands::Set { key, value } => {
            cmd_set(&key, &value);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::About => {
            cmd_about();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn cmd_run(
    waveform: Option<PathBuf>,
    low_power: bool,
    model_path: Option<PathBuf>,
    threshold: f32,
    min_gap_ms: i64,
) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gripsense_agent=info".into()),
        )
        .init();

    println!("Gripsense Agent v{VERSION}");
    println!();

    // Load persisted settings
    let settings = SettingsStore::shared_default();
    let snapshot = settings.snapshot();

    // Build the sensor device
    let device: Box<dyn SensorDevice> = match waveform {
        Some(ref path) => match SyntheticDevice::from_script(path, DEFAULT_CADENCE) {
            Ok(device) => {
                println!("Waveform script: {path:?}");
                let device = if low_power { device.with_low_power() } else { device };
                Box::new(device)
            }
            Err(e) => {
                eprintln!("Error loading waveform script: {e}");
                std::process::exit(1);
            }
        },
        None => {
            let device = SyntheticDevice::squeeze_pattern();
            let device = if low_power { device.with_low_power() } else { device };
            Box::new(device)
        }
    };

    // Load the classifier; a missing model degrades to silence
    let model = match model_path {
        Some(ref path) => GestureModel::load(path),
        None => GestureModel::builtin(),
    };
    if !model.is_available() {
        eprintln!("Warning: classifier unavailable; squeezes will not be detected.");
    }

    println!("Starting gesture agent...");
    println!(
        "  Detection: {}",
        if snapshot.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "  Sensitivity: {} (sensor gain {:.2})",
        snapshot.sensitivity,
        sensitivity_from_raw(snapshot.sensitivity)
    );
    println!("  Action: {}", snapshot.action);
    println!("  Haptics: {}", haptic_label(snapshot.haptic_intensity));
    println!("  Allow screen off: {}", snapshot.allow_screen_off);
    println!(
        "  Acquisition: {}",
        if device.supports_low_power() {
            "low-power batch"
        } else {
            "polling"
        }
    );

    let controller = GestureController::new(source_for_device(device), model)
        .with_decision_rule(threshold, chrono::Duration::milliseconds(min_gap_ms));

    // Condition monitors. A platform integration feeds these; without one
    // the gates rest in their non-blocking states.
    let call = StateMonitor::shared(CallState::Idle);
    let vr = StateMonitor::shared(false);
    let proximity = StateMonitor::shared(f32::MAX);
    let dock = StateMonitor::shared(DockState::Undocked);
    let screen = StateMonitor::shared(ScreenState::On);

    let mut gates = GateSet::new();
    gates.insert(Box::new(CallGate::new(call.clone())));
    gates.insert(Box::new(VrGate::new(vr.clone())));
    gates.insert(Box::new(PocketGate::new(proximity.clone())));
    gates.insert(Box::new(TabletopGate::new(dock.clone())));
    gates.insert(Box::new(SettingsGate::new(settings.clone())));

    let diagnostics = create_shared_log_with_persistence(DiagnosticsLog::default_path());

    let mut service = GestureService::new(
        settings,
        controller,
        gates,
        ActionRegistry::with_builtin(),
        Box::new(LogHaptics),
        screen,
        diagnostics,
    );

    println!("Instance ID: {}", agent_instance_id());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    service.start();
    service.run(running);

    println!();
    println!("{}", service.diagnostics().summary());
}

fn cmd_enable() {
    let store = SettingsStore::shared_default();
    store.set_enabled(true);
    if let Err(e) = store.save() {
        eprintln!("Error saving settings: {e}");
        std::process::exit(1);
    }
    println!("Gesture detection enabled.");
}

fn cmd_disable() {
    let store = SettingsStore::shared_default();
    store.set_enabled(false);
    if let Err(e) = store.save() {
        eprintln!("Error saving settings: {e}");
        std::process::exit(1);
    }
    println!("Gesture detection disabled. Use 'gripsense enable' to turn it back on.");
}

fn cmd_set(key: &str, value: &str) {
    let store = SettingsStore::shared_default();

    match key {
        "sensitivity" => {
            let raw: u32 = match value.parse() {
                Ok(v) => v,
                Err(_) => {
                    eprintln!("Error: sensitivity must be a non-negative integer");
                    std::process::exit(1);
                }
            };
            store.set_sensitivity(raw);
            println!(
                "Sensitivity set to {raw} (sensor gain {:.2}).",
                sensitivity_from_raw(raw)
            );
        }
        "action" => {
            let known = ActionRegistry::with_builtin().known_keys();
            if !known.iter().any(|k| k == value) {
                eprintln!("Warning: '{value}' is not a bundled action; squeezes will be ignored.");
                eprintln!("Bundled actions: {}", known.join(", "));
            }
            store.set_action(value);
            println!("Action set to '{value}'.");
        }
        "haptics" => {
            let intensity = match value {
                "off" | "0" => HapticIntensity::Off,
                "light" | "1" => HapticIntensity::Light,
                "strong" | "2" => HapticIntensity::Strong,
                _ => {
                    eprintln!("Error: haptics must be one of off, light, strong");
                    std::process::exit(1);
                }
            };
            store.set_haptic_intensity(intensity);
            println!("Haptic feedback set to {}.", haptic_label(intensity));
        }
        "allow-screen-off" => {
            let allow = parse_bool(value);
            store.set_allow_screen_off(allow);
            println!(
                "Screen-off gestures {}.",
                if allow { "allowed" } else { "disallowed" }
            );
        }
        "tuning" => {
            let tuning = parse_bool(value);
            store.set_tuning_active(tuning);
            println!(
                "Sensitivity tuning mode {}.",
                if tuning { "on" } else { "off" }
            );
        }
        other => {
            eprintln!("Error: unknown setting '{other}'");
            eprintln!("Valid keys: sensitivity, action, haptics, allow-screen-off, tuning");
            std::process::exit(1);
        }
    }

    if let Err(e) = store.save() {
        eprintln!("Error saving settings: {e}");
        std::process::exit(1);
    }
}

fn cmd_status() {
    let settings = Settings::load().unwrap_or_default();

    println!("Gripsense Agent Status");
    println!("======================");
    println!();

    println!("Configuration:");
    println!(
        "  Detection: {}",
        if settings.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "  Sensitivity: {} (sensor gain {:.2})",
        settings.sensitivity,
        sensitivity_from_raw(settings.sensitivity)
    );
    println!("  Action: {}", settings.action);
    println!("  Haptics: {}", haptic_label(settings.haptic_intensity));
    println!("  Allow screen off: {}", settings.allow_screen_off);
    if settings.action_requires_screen_on {
        println!("  Note: the selected action needs the screen; detection stops at screen off.");
    }
    println!("  Tuning active: {}", settings.tuning_active);
    println!();

    // Load and show dispatch stats if available
    let stats_path = DiagnosticsLog::default_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(samples) = stats.get("samples_processed") {
                    println!("  Samples processed: {samples}");
                }
                if let Some(detected) = stats.get("gestures_detected") {
                    println!("  Squeezes detected: {detected}");
                }
                if let Some(dispatched) = stats.get("gestures_dispatched") {
                    println!("  Actions dispatched: {dispatched}");
                }
                if let Some(consumed) = stats.get("gestures_consumed") {
                    println!("  Consumed for tuning: {consumed}");
                }
                if let Some(suppressed) = stats.get("gestures_suppressed") {
                    println!("  Suppressed: {suppressed}");
                }
                if let Some(failures) = stats.get("action_failures") {
                    println!("  Action failures: {failures}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_about() {
    println!("{AGENT_DECLARATION}");
}

fn cmd_config() {
    let settings = Settings::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Settings file: {:?}", Settings::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&settings).unwrap_or_else(|_| "Error".to_string())
    );
}

fn haptic_label(intensity: HapticIntensity) -> &'static str {
    match intensity {
        HapticIntensity::Off => "off",
        HapticIntensity::Light => "light",
        HapticIntensity::Strong => "strong",
    }
}

fn parse_bool(value: &str) -> bool {
    match value {
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        _ => {
            eprintln!("Error: expected true/false");
            std::process::exit(1);
        }
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
