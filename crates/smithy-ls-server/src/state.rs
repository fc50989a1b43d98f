//! Shared server state.

use std::collections::HashSet;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde_json::Value;
use smithy_ls_model::Severity;
use smithy_ls_project::ProjectManager;

/// Everything the dispatcher owns across requests: the project manager,
/// the configured severity floor, and the set of cancelled request ids.
pub struct ServerState {
    pub manager: ProjectManager,
    pub root: Mutex<Option<PathBuf>>,
    pub minimum_severity: Mutex<Severity>,
    cancelled: Mutex<HashSet<String>>,
    shutdown_requested: Mutex<bool>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            manager: ProjectManager::new(),
            root: Mutex::new(None),
            minimum_severity: Mutex::new(Severity::Warning),
            cancelled: Mutex::new(HashSet::new()),
            shutdown_requested: Mutex::new(false),
        }
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `$/cancelRequest` id.
    pub fn cancel(&self, id: &Value) {
        self.cancelled.lock().insert(id.to_string());
    }

    /// Whether `id` was cancelled, consuming the record.
    pub fn take_cancelled(&self, id: &Value) -> bool {
        self.cancelled.lock().remove(&id.to_string())
    }

    pub fn request_shutdown(&self) {
        *self.shutdown_requested.lock() = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown_requested.lock()
    }

    pub fn minimum_severity(&self) -> Severity {
        *self.minimum_severity.lock()
    }

    /// Apply `initializationOptions` / `didChangeConfiguration`
    /// settings. Currently the severity floor.
    pub fn apply_settings(&self, settings: &Value) {
        if let Some(severity) = settings
            .get("minimumSeverity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
        {
            *self.minimum_severity.lock() = severity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cancellation_records_consume() {
        let state = ServerState::new();
        state.cancel(&json!(7));
        assert!(state.take_cancelled(&json!(7)));
        assert!(!state.take_cancelled(&json!(7)));
    }

    #[test]
    fn settings_update_the_severity_floor() {
        let state = ServerState::new();
        state.apply_settings(&json!({"minimumSeverity": "NOTE"}));
        assert_eq!(state.minimum_severity(), Severity::Note);
        state.apply_settings(&json!({"minimumSeverity": "bogus"}));
        assert_eq!(state.minimum_severity(), Severity::Note);
    }
}
