/// Foreground watchdog: the repeating timer and its tick decision logic.
///
/// Once per poll interval, read the foreground status and the externally
/// recorded session state. The first tick that observes the terminal marker
/// latches `LaunchPending`; from then on, every tick that finds the app
/// backgrounded issues a foreground launch. Nothing here ever clears the
/// latch — it lives and dies with the timer task.
use crate::launcher::ForegroundLauncher;
use crate::probe::ForegroundProbe;
use crate::sink::ErrorSink;
use crate::state::SessionStateSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Launch state of the current timer task.
///
/// `LaunchPending` is sticky: no transition leads back to `Idle` within a
/// timer task's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// No terminal marker observed yet.
    Idle,
    /// A tick saw the terminal marker; keep relaunching while backgrounded.
    LaunchPending,
}

impl LaunchState {
    /// Fold one state snapshot into the launch state. The only transition is
    /// `Idle -> LaunchPending`, taken when the snapshot equals the terminal
    /// marker; an absent or non-terminal snapshot leaves the state unchanged.
    fn observe(self, snapshot: Option<&str>, terminal_marker: &str) -> LaunchState {
        match snapshot {
            Some(s) if s == terminal_marker => LaunchState::LaunchPending,
            _ => self,
        }
    }
}

/// Decide what a single tick does: the next launch state, and whether a
/// foreground launch must be issued this tick.
///
/// Pure so the tick semantics are testable without a timer. A launch is
/// issued exactly when the app is backgrounded and the (updated) state is
/// `LaunchPending`; the decision repeats on every qualifying tick since the
/// latch is never cleared.
pub fn evaluate_tick(
    state: LaunchState,
    is_app_foreground: bool,
    snapshot: Option<&str>,
    terminal_marker: &str,
) -> (LaunchState, bool) {
    let next = state.observe(snapshot, terminal_marker);
    let launch = !is_app_foreground && next == LaunchState::LaunchPending;
    (next, launch)
}

/// Errors that can occur while scheduling the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A repeating timer needs a positive period.
    InvalidInterval { millis: u64 },
    /// No live async runtime to schedule on (scheduling after shutdown).
    RuntimeUnavailable,
}

impl ScheduleError {
    /// Stable identifier used as the `kind` column when persisted.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::InvalidInterval { .. } => "invalid_interval",
            ScheduleError::RuntimeUnavailable => "runtime_unavailable",
        }
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::InvalidInterval { millis } => {
                write!(f, "invalid poll interval: {millis}ms")
            }
            ScheduleError::RuntimeUnavailable => {
                write!(f, "no async runtime available to schedule the timer")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Handle to the active timer task.
struct TimerHandle {
    stop: watch::Sender<bool>,
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// The watchdog itself. Owns at most one timer task at a time.
pub struct Watchdog {
    poll_interval: Duration,
    initial_delay: Duration,
    terminal_marker: String,
    probe: Arc<dyn ForegroundProbe>,
    states: Arc<dyn SessionStateSource>,
    launcher: Arc<dyn ForegroundLauncher>,
    sink: Arc<dyn ErrorSink>,
    timer: Option<TimerHandle>,
}

impl Watchdog {
    pub fn new(
        poll_interval: Duration,
        initial_delay: Duration,
        terminal_marker: impl Into<String>,
        probe: Arc<dyn ForegroundProbe>,
        states: Arc<dyn SessionStateSource>,
        launcher: Arc<dyn ForegroundLauncher>,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            poll_interval,
            initial_delay,
            terminal_marker: terminal_marker.into(),
            probe,
            states,
            launcher,
            sink,
            timer: None,
        }
    }

    /// Start the repeating timer. Idempotent: any existing timer is stopped
    /// first, so two calls leave exactly one active timer.
    ///
    /// Scheduling failures do not propagate — they are recorded to the error
    /// sink and the watchdog stays stopped.
    pub fn start(&mut self) {
        if let Err(err) = self.try_schedule() {
            tracing::warn!(error = %err, "failed to schedule watchdog timer");
            self.sink.record(&err);
        }
    }

    fn try_schedule(&mut self) -> Result<(), ScheduleError> {
        self.stop();

        if self.poll_interval.is_zero() {
            return Err(ScheduleError::InvalidInterval { millis: 0 });
        }
        let runtime = Handle::try_current().map_err(|_| ScheduleError::RuntimeUnavailable)?;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let poll_interval = self.poll_interval;
        let initial_delay = self.initial_delay;
        let terminal_marker = self.terminal_marker.clone();
        let probe = Arc::clone(&self.probe);
        let states = Arc::clone(&self.states);
        let launcher = Arc::clone(&self.launcher);

        let task = runtime.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + initial_delay, poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut state = LaunchState::Idle;
            loop {
                tokio::select! {
                    // Stop wins against a due tick; an in-flight tick has
                    // already left the select and always completes.
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        state = run_tick(state, &*probe, &*states, &*launcher, &terminal_marker);
                    }
                }
            }
            tracing::debug!("watchdog timer task exited");
        });

        tracing::info!(
            poll_interval_ms = poll_interval.as_millis() as u64,
            initial_delay_ms = initial_delay.as_millis() as u64,
            "watchdog timer scheduled"
        );
        self.timer = Some(TimerHandle { stop: stop_tx, task });
        Ok(())
    }

    /// Stop the timer if one is active; no-op otherwise. The task is told to
    /// stop and detached — no join, cancellation lands at the next tick
    /// boundary.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            let _ = timer.stop.send(true);
            tracing::info!("watchdog timer stopped");
        }
    }

    /// Whether a timer task is currently scheduled.
    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }
}

/// One timer fire: poll, fold the snapshot, maybe launch.
fn run_tick(
    state: LaunchState,
    probe: &dyn ForegroundProbe,
    states: &dyn SessionStateSource,
    launcher: &dyn ForegroundLauncher,
    terminal_marker: &str,
) -> LaunchState {
    let is_app_foreground = probe.is_app_foreground();
    let snapshot = states.state();
    tracing::debug!(
        is_app_foreground,
        snapshot = ?snapshot,
        "watchdog tick"
    );

    let (next, launch) =
        evaluate_tick(state, is_app_foreground, snapshot.as_deref(), terminal_marker);
    if launch {
        tracing::info!("app backgrounded after session end, requesting foreground launch");
        launcher.bring_to_foreground();
    }
    next
}
