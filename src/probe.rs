/// Foreground status probing.
///
/// The watchdog never asks the platform directly whether the supervised app
/// is visible; it goes through this trait so tests can script the answer.
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::path::PathBuf;

/// Answers "is the supervised app currently in the foreground?".
///
/// Infallible by contract: any failure to determine the answer maps to
/// `false` (treated as backgrounded) with a log line.
pub trait ForegroundProbe: Send + Sync {
    fn is_app_foreground(&self) -> bool;
}

/// Probes via a pid file written by the supervised app while it holds the
/// screen. The app removes the file (or stops refreshing the pid) when it
/// drops to the background, so a live pid behind the file means foregrounded.
pub struct PidFileProbe {
    pid_file: PathBuf,
}

impl PidFileProbe {
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
        }
    }

    fn read_pid(&self) -> Option<i32> {
        let contents = match std::fs::read_to_string(&self.pid_file) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    path = %self.pid_file.display(),
                    "pid file unreadable, treating app as backgrounded"
                );
                return None;
            }
        };
        match contents.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => Some(pid),
            _ => {
                tracing::warn!(
                    path = %self.pid_file.display(),
                    "pid file did not contain a valid pid"
                );
                None
            }
        }
    }
}

impl ForegroundProbe for PidFileProbe {
    fn is_app_foreground(&self) -> bool {
        match self.read_pid() {
            Some(pid) => process_alive(pid),
            None => false,
        }
    }
}

/// Signal-0 probe: checks process existence without delivering a signal.
fn process_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn probe_with_contents(contents: &str) -> (TempDir, PidFileProbe) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.pid");
        std::fs::write(&path, contents).unwrap();
        (dir, PidFileProbe::new(path))
    }

    #[test]
    fn missing_pid_file_means_backgrounded() {
        let dir = TempDir::new().unwrap();
        let probe = PidFileProbe::new(dir.path().join("absent.pid"));
        assert!(!probe.is_app_foreground());
    }

    #[test]
    fn garbled_pid_file_means_backgrounded() {
        let (_dir, probe) = probe_with_contents("not-a-pid\n");
        assert!(!probe.is_app_foreground());
    }

    #[test]
    fn empty_pid_file_means_backgrounded() {
        let (_dir, probe) = probe_with_contents("");
        assert!(!probe.is_app_foreground());
    }

    #[test]
    fn negative_pid_means_backgrounded() {
        // A negative value would address a process group; never probe one.
        let (_dir, probe) = probe_with_contents("-1");
        assert!(!probe.is_app_foreground());
    }

    #[test]
    fn own_pid_is_foregrounded() {
        let (_dir, probe) = probe_with_contents(&format!("{}\n", std::process::id()));
        assert!(probe.is_app_foreground());
    }

    #[test]
    fn exited_process_is_backgrounded() {
        // Spawn and reap a short-lived child; its pid is no longer live.
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let (_dir, probe) = probe_with_contents(&pid.to_string());
        assert!(!probe.is_app_foreground());
    }
}
