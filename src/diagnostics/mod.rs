//! Diagnostics for the gripsense agent.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, DiagnosticsLog, DiagnosticsStats,
    SharedDiagnostics,
};

/// Generate an instance id for log and status output.
pub fn agent_instance_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!(
        "grip-{}-{}",
        hostname,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ids_are_unique() {
        let a = agent_instance_id();
        let b = agent_instance_id();
        assert!(a.starts_with("grip-"));
        assert_ne!(a, b);
    }
}
