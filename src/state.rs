/// Session state access.
///
/// The session recorder (a separate process) owns the state value; this
/// module only reads it. The watchdog compares the snapshot against the
/// configured terminal marker and never writes anything back.
use std::path::PathBuf;

/// Terminal marker used when the config does not override it.
pub const DEFAULT_TERMINAL_MARKER: &str = "END";

/// Read accessor for the externally recorded session state.
///
/// `None` means the state is currently unavailable (recorder not started,
/// file missing); the watchdog treats that tick as "state unchanged".
pub trait SessionStateSource: Send + Sync {
    fn state(&self) -> Option<String>;
}

/// Reads the session state from a small flat file maintained by the recorder.
pub struct FileStateSource {
    path: PathBuf,
}

impl FileStateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStateSource for FileStateSource {
    fn state(&self) -> Option<String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    path = %self.path.display(),
                    "state file unreadable, skipping snapshot this tick"
                );
                return None;
            }
        };
        let state = contents.trim();
        if state.is_empty() {
            return None;
        }
        Some(state.to_string())
    }
}
