//! Diagnostics counters for the gripsense agent.
//!
//! Tracks how squeezes move through the pipeline (detected, dispatched,
//! consumed, suppressed) without recording anything about the gestures
//! themselves. Counters survive restarts via a small JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter set for the current agent instance.
#[derive(Debug)]
pub struct DiagnosticsLog {
    /// Sensor samples pumped through the controller
    samples_processed: AtomicU64,
    /// Squeezes raised by the controller
    gestures_detected: AtomicU64,
    /// Squeezes that reached an action's run effect
    gestures_dispatched: AtomicU64,
    /// Squeezes consumed by the settings gate for tuning
    gestures_consumed: AtomicU64,
    /// Squeezes dropped because the agent was idle or the action not runnable
    gestures_suppressed: AtomicU64,
    /// Action run effects that returned an error
    action_failures: AtomicU64,
    /// Wake lock acquisitions for gesture handling
    wake_acquisitions: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self {
            samples_processed: AtomicU64::new(0),
            gestures_detected: AtomicU64::new(0),
            gestures_dispatched: AtomicU64::new(0),
            gestures_consumed: AtomicU64::new(0),
            gestures_suppressed: AtomicU64::new(0),
            action_failures: AtomicU64::new(0),
            wake_acquisitions: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log with persistence, loading previous counters if present.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("could not load previous diagnostics: {e}");
        }

        log
    }

    /// Default diagnostics location under the local data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gripsense")
            .join("diagnostics.json")
    }

    pub fn record_samples(&self, count: u64) {
        self.samples_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_detected(&self) {
        self.gestures_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatched(&self) {
        self.gestures_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consumed(&self) {
        self.gestures_consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suppressed(&self) {
        self.gestures_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_action_failure(&self) {
        self.action_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wake_acquisition(&self) {
        self.wake_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counters.
    pub fn stats(&self) -> DiagnosticsStats {
        DiagnosticsStats {
            samples_processed: self.samples_processed.load(Ordering::Relaxed),
            gestures_detected: self.gestures_detected.load(Ordering::Relaxed),
            gestures_dispatched: self.gestures_dispatched.load(Ordering::Relaxed),
            gestures_consumed: self.gestures_consumed.load(Ordering::Relaxed),
            gestures_suppressed: self.gestures_suppressed.load(Ordering::Relaxed),
            action_failures: self.action_failures.load(Ordering::Relaxed),
            wake_acquisitions: self.wake_acquisitions.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Agent Statistics:\n\
             - Samples processed: {}\n\
             - Squeezes detected: {}\n\
             - Actions dispatched: {}\n\
             - Consumed for tuning: {}\n\
             - Suppressed: {}\n\
             - Action failures: {}\n\
             - Wake acquisitions: {}\n\
             - Session duration: {} seconds",
            stats.samples_processed,
            stats.gestures_detected,
            stats.gestures_dispatched,
            stats.gestures_consumed,
            stats.gestures_suppressed,
            stats.action_failures,
            stats.wake_acquisitions,
            stats.session_duration_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_processed: stats.samples_processed,
                gestures_detected: stats.gestures_detected,
                gestures_dispatched: stats.gestures_dispatched,
                gestures_consumed: stats.gestures_consumed,
                gestures_suppressed: stats.gestures_suppressed,
                action_failures: stats.action_failures,
                wake_acquisitions: stats.wake_acquisitions,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load counters from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_processed
                    .store(persisted.samples_processed, Ordering::Relaxed);
                self.gestures_detected
                    .store(persisted.gestures_detected, Ordering::Relaxed);
                self.gestures_dispatched
                    .store(persisted.gestures_dispatched, Ordering::Relaxed);
                self.gestures_consumed
                    .store(persisted.gestures_consumed, Ordering::Relaxed);
                self.gestures_suppressed
                    .store(persisted.gestures_suppressed, Ordering::Relaxed);
                self.action_failures
                    .store(persisted.action_failures, Ordering::Relaxed);
                self.wake_acquisitions
                    .store(persisted.wake_acquisitions, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.samples_processed.store(0, Ordering::Relaxed);
        self.gestures_detected.store(0, Ordering::Relaxed);
        self.gestures_dispatched.store(0, Ordering::Relaxed);
        self.gestures_consumed.store(0, Ordering::Relaxed);
        self.gestures_suppressed.store(0, Ordering::Relaxed);
        self.action_failures.store(0, Ordering::Relaxed);
        self.wake_acquisitions.store(0, Ordering::Relaxed);
    }
}

impl Default for DiagnosticsLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of diagnostics counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsStats {
    pub samples_processed: u64,
    pub gestures_detected: u64,
    pub gestures_dispatched: u64,
    pub gestures_consumed: u64,
    pub gestures_suppressed: u64,
    pub action_failures: u64,
    pub wake_acquisitions: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Counter format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_processed: u64,
    gestures_detected: u64,
    gestures_dispatched: u64,
    gestures_consumed: u64,
    gestures_suppressed: u64,
    action_failures: u64,
    wake_acquisitions: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared diagnostics log.
pub type SharedDiagnostics = Arc<DiagnosticsLog>;

/// Create a new shared diagnostics log.
pub fn create_shared_log() -> SharedDiagnostics {
    Arc::new(DiagnosticsLog::new())
}

/// Create a new shared diagnostics log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedDiagnostics {
    Arc::new(DiagnosticsLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_recording() {
        let log = DiagnosticsLog::new();

        log.record_samples(42);
        log.record_detected();
        log.record_detected();
        log.record_dispatched();
        log.record_consumed();

        let stats = log.stats();
        assert_eq!(stats.samples_processed, 42);
        assert_eq!(stats.gestures_detected, 2);
        assert_eq!(stats.gestures_dispatched, 1);
        assert_eq!(stats.gestures_consumed, 1);
        assert_eq!(stats.gestures_suppressed, 0);
    }

    #[test]
    fn test_reset_clears_counters() {
        let log = DiagnosticsLog::new();
        log.record_samples(100);
        log.record_wake_acquisition();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.samples_processed, 0);
        assert_eq!(stats.wake_acquisitions, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "gripsense-diag-test-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let log = DiagnosticsLog::with_persistence(path.clone());
        log.record_detected();
        log.record_dispatched();
        log.save().unwrap();

        let reloaded = DiagnosticsLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.gestures_detected, 1);
        assert_eq!(stats.gestures_dispatched, 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_summary_format() {
        let log = DiagnosticsLog::new();
        let summary = log.summary();

        assert!(summary.contains("Squeezes detected"));
        assert!(summary.contains("Actions dispatched"));
        assert!(summary.contains("Wake acquisitions"));
    }
}
