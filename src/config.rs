use crate::state::DEFAULT_TERMINAL_MARKER;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from resurface.toml.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ResurfaceConfig {
    pub watchdog: WatchdogConfig,
    pub app: AppConfig,
    pub state: StateConfig,
    pub errors: ErrorConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub poll_interval_ms: u64,
    pub initial_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pid_file: PathBuf,
    pub launch_command: String,
    pub launch_args: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub state_file: PathBuf,
    pub terminal_marker: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ErrorConfig {
    /// When set, scheduling errors are persisted to this SQLite database
    /// instead of only being logged.
    pub db_path: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            initial_delay_ms: 0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from("app.pid"),
            launch_command: "app".to_string(),
            launch_args: vec![],
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("session.state"),
            terminal_marker: DEFAULT_TERMINAL_MARKER.to_string(),
        }
    }
}

/// Load configuration from a TOML file.
///
/// A missing file yields the built-in defaults; a present but malformed file
/// is an error. A zero poll interval is NOT rejected here — it flows into
/// `Watchdog::start()`, which reports it through the error sink.
pub fn load(path: &Path) -> Result<ResurfaceConfig, String> {
    if !path.exists() {
        return Ok(ResurfaceConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    toml::from_str(&contents).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}
