/// Foreground launch: bring the supervised app back on screen.
///
/// Fire-and-forget by contract — the watchdog gets no acknowledgement and
/// will simply ask again on the next tick if the app is still backgrounded.
use std::process::Stdio;
use tokio::process::Command;

pub trait ForegroundLauncher: Send + Sync {
    fn bring_to_foreground(&self);
}

/// Spawns the configured launch command.
///
/// The launched process is detached: we never wait on it, and its output is
/// discarded. Spawn failures are logged and otherwise dropped.
pub struct CommandLauncher {
    command: String,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl ForegroundLauncher for CommandLauncher {
    fn bring_to_foreground(&self) {
        match Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::info!(
                    command = %self.command,
                    pid = ?child.id(),
                    "issued foreground launch"
                );
            }
            Err(e) => {
                tracing::warn!(
                    command = %self.command,
                    error = %e,
                    "failed to spawn foreground launch command"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_configured_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("launched");

        let launcher = CommandLauncher::new(
            "touch",
            vec![marker.to_string_lossy().into_owned()],
        );
        launcher.bring_to_foreground();

        // Detached spawn: poll briefly for the side effect.
        for _ in 0..50 {
            if marker.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("launch command never ran");
    }

    #[tokio::test]
    async fn spawn_failure_does_not_panic() {
        let launcher = CommandLauncher::new("nonexistent-binary-xyz", vec![]);
        launcher.bring_to_foreground();
    }
}
