//! Settings snapshot and store for the gripsense agent.
//!
//! Settings are persisted as JSON under the user config directory and are
//! the only mutable configuration surface of the agent. The store notifies
//! registered listeners with the changed key, and `reload_from_disk` lets a
//! running agent pick up changes written by another process (the `enable`,
//! `disable` and `set` CLI commands).

use crate::platform::SubscriberId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Default wire value for the sensitivity slider.
pub const DEFAULT_SENSITIVITY: u32 = 5;

/// Haptic feedback strength, stored on the wire as 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HapticIntensity {
    Off,
    Light,
    Strong,
}

impl TryFrom<u8> for HapticIntensity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HapticIntensity::Off),
            1 => Ok(HapticIntensity::Light),
            2 => Ok(HapticIntensity::Strong),
            other => Err(format!("invalid haptic intensity {other}, expected 0-2")),
        }
    }
}

impl From<HapticIntensity> for u8 {
    fn from(value: HapticIntensity) -> Self {
        match value {
            HapticIntensity::Off => 0,
            HapticIntensity::Light => 1,
            HapticIntensity::Strong => 2,
        }
    }
}

/// Persisted settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Master switch for the squeeze gesture feature
    pub enabled: bool,

    /// Raw sensitivity slider value (see [`sensitivity_from_raw`])
    pub sensitivity: u32,

    /// Key of the action to dispatch on a confirmed squeeze
    pub action: String,

    /// Haptic feedback strength
    pub haptic_intensity: HapticIntensity,

    /// Whether the user allows gestures while the screen is off
    pub allow_screen_off: bool,

    /// Set by the settings UI while the user live-tunes sensitivity;
    /// squeezes are consumed for tuning instead of dispatched
    pub tuning_active: bool,

    /// Derived flag written back by the agent: the selected action cannot
    /// run while the screen is off, so the allow-screen-off toggle is moot
    pub action_requires_screen_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: DEFAULT_SENSITIVITY,
            action: crate::action::keys::ASSISTANT.to_string(),
            haptic_intensity: HapticIntensity::Light,
            allow_screen_off: false,
            tuning_active: false,
            action_requires_screen_on: false,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from an explicit path.
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let settings: Settings = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the settings file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gripsense")
            .join("settings.json")
    }
}

/// Map the raw sensitivity slider value to the sensor sensitivity.
///
/// Two-piece scale kept for behavioral compatibility with stored sliders:
/// the low range is fine-grained (steps of 0.01, reaching 0.05 at raw 5),
/// the high range coarse (steps of 0.15 above it).
pub fn sensitivity_from_raw(raw: u32) -> f32 {
    if raw <= 5 {
        raw as f32 * 0.01
    } else {
        (raw - 5) as f32 * 0.15
    }
}

/// Identifies which setting changed in a store notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Enabled,
    Sensitivity,
    Action,
    HapticIntensity,
    AllowScreenOff,
    TuningActive,
    ActionRequiresScreenOn,
}

/// Listener callback invoked with the key that changed.
pub type SettingsListener = Arc<dyn Fn(SettingKey) + Send + Sync>;

/// Thread-safe settings store with change notification.
///
/// Setters notify listeners at most once per actual value change. The
/// store optionally tracks a backing file so `reload_from_disk` can diff
/// external edits into notifications.
pub struct SettingsStore {
    inner: Mutex<Settings>,
    listeners: Mutex<Vec<(SubscriberId, SettingsListener)>>,
    path: Option<PathBuf>,
    last_modified: Mutex<Option<SystemTime>>,
}

/// Shared handle to a settings store.
pub type SharedSettingsStore = Arc<SettingsStore>;

impl SettingsStore {
    /// Create a store around an in-memory snapshot (no persistence).
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(settings),
            listeners: Mutex::new(Vec::new()),
            path: None,
            last_modified: Mutex::new(None),
        }
    }

    /// Create a store backed by a settings file, loading it if present.
    pub fn with_persistence(path: PathBuf) -> Self {
        let settings = Settings::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("could not load settings from {:?}: {e}", path);
            Settings::default()
        });
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();

        Self {
            inner: Mutex::new(settings),
            listeners: Mutex::new(Vec::new()),
            path: Some(path),
            last_modified: Mutex::new(modified),
        }
    }

    /// Create a shared store at the default settings location.
    pub fn shared_default() -> SharedSettingsStore {
        Arc::new(Self::with_persistence(Settings::config_path()))
    }

    /// Current snapshot (cloned).
    pub fn snapshot(&self) -> Settings {
        self.inner.lock().expect("settings lock poisoned").clone()
    }

    pub fn enabled(&self) -> bool {
        self.snapshot().enabled
    }

    pub fn sensitivity(&self) -> u32 {
        self.snapshot().sensitivity
    }

    pub fn action_key(&self) -> String {
        self.snapshot().action
    }

    pub fn haptic_intensity(&self) -> HapticIntensity {
        self.snapshot().haptic_intensity
    }

    pub fn allow_screen_off(&self) -> bool {
        self.snapshot().allow_screen_off
    }

    pub fn tuning_active(&self) -> bool {
        self.snapshot().tuning_active
    }

    pub fn action_requires_screen_on(&self) -> bool {
        self.snapshot().action_requires_screen_on
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.update(SettingKey::Enabled, |s| {
            let changed = s.enabled != enabled;
            s.enabled = enabled;
            changed
        });
    }

    pub fn set_sensitivity(&self, sensitivity: u32) {
        self.update(SettingKey::Sensitivity, |s| {
            let changed = s.sensitivity != sensitivity;
            s.sensitivity = sensitivity;
            changed
        });
    }

    pub fn set_action(&self, action: &str) {
        self.update(SettingKey::Action, |s| {
            let changed = s.action != action;
            s.action = action.to_string();
            changed
        });
    }

    pub fn set_haptic_intensity(&self, intensity: HapticIntensity) {
        self.update(SettingKey::HapticIntensity, |s| {
            let changed = s.haptic_intensity != intensity;
            s.haptic_intensity = intensity;
            changed
        });
    }

    pub fn set_allow_screen_off(&self, allow: bool) {
        self.update(SettingKey::AllowScreenOff, |s| {
            let changed = s.allow_screen_off != allow;
            s.allow_screen_off = allow;
            changed
        });
    }

    pub fn set_tuning_active(&self, tuning: bool) {
        self.update(SettingKey::TuningActive, |s| {
            let changed = s.tuning_active != tuning;
            s.tuning_active = tuning;
            changed
        });
    }

    /// Write-back of the one derived flag the agent owns.
    pub fn set_action_requires_screen_on(&self, required: bool) {
        self.update(SettingKey::ActionRequiresScreenOn, |s| {
            let changed = s.action_requires_screen_on != required;
            s.action_requires_screen_on = required;
            changed
        });
    }

    /// Register a change listener. Re-registering the same id replaces the
    /// previous callback.
    pub fn register_listener(&self, id: SubscriberId, listener: SettingsListener) {
        let mut listeners = self.listeners.lock().expect("settings listeners poisoned");
        if let Some(entry) = listeners.iter_mut().find(|(lid, _)| *lid == id) {
            entry.1 = listener;
        } else {
            listeners.push((id, listener));
        }
    }

    /// Remove a change listener. Unknown ids are a no-op.
    pub fn unregister_listener(&self, id: SubscriberId) {
        let mut listeners = self.listeners.lock().expect("settings listeners poisoned");
        listeners.retain(|(lid, _)| *lid != id);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("settings listeners poisoned")
            .len()
    }

    /// Persist the current snapshot to the backing file, if any.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.path {
            let snapshot = self.snapshot();
            snapshot.save_to(path)?;
            if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
                *self.last_modified.lock().expect("settings mtime poisoned") = Some(modified);
            }
        }
        Ok(())
    }

    /// Re-read the backing file and diff it against the in-memory snapshot,
    /// notifying one key per changed field. Returns the changed keys.
    ///
    /// Cheap when the file's mtime is unchanged. Read or parse failures are
    /// fail-soft: the in-memory snapshot stays authoritative.
    pub fn reload_from_disk(&self) -> Vec<SettingKey> {
        let Some(ref path) = self.path else {
            return Vec::new();
        };

        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        {
            let mut last = self.last_modified.lock().expect("settings mtime poisoned");
            if modified.is_some() && *last == modified {
                return Vec::new();
            }
            *last = modified;
        }

        let fresh = match Settings::load_from(path) {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!("settings reload failed, keeping previous values: {e}");
                return Vec::new();
            }
        };

        let mut changed = Vec::new();
        {
            let mut current = self.inner.lock().expect("settings lock poisoned");
            if current.enabled != fresh.enabled {
                changed.push(SettingKey::Enabled);
            }
            if current.sensitivity != fresh.sensitivity {
                changed.push(SettingKey::Sensitivity);
            }
            if current.action != fresh.action {
                changed.push(SettingKey::Action);
            }
            if current.haptic_intensity != fresh.haptic_intensity {
                changed.push(SettingKey::HapticIntensity);
            }
            if current.allow_screen_off != fresh.allow_screen_off {
                changed.push(SettingKey::AllowScreenOff);
            }
            if current.tuning_active != fresh.tuning_active {
                changed.push(SettingKey::TuningActive);
            }
            if current.action_requires_screen_on != fresh.action_requires_screen_on {
                changed.push(SettingKey::ActionRequiresScreenOn);
            }
            *current = fresh;
        }

        for key in &changed {
            self.notify(*key);
        }
        changed
    }

    fn update(&self, key: SettingKey, apply: impl FnOnce(&mut Settings) -> bool) {
        let changed = {
            let mut settings = self.inner.lock().expect("settings lock poisoned");
            apply(&mut settings)
        };
        if changed {
            self.notify(key);
        }
    }

    fn notify(&self, key: SettingKey) {
        let listeners: Vec<SettingsListener> = {
            let listeners = self.listeners.lock().expect("settings listeners poisoned");
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(key);
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
