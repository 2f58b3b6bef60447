/// Error sinks for scheduling failures.
///
/// The watchdog swallows scheduling errors by contract — `start()` never
/// propagates them — so the sink is the only place they become observable.
use crate::db;
use crate::watchdog::ScheduleError;
use std::path::PathBuf;

pub trait ErrorSink: Send + Sync {
    fn record(&self, error: &ScheduleError);
}

/// Records errors to the log only.
pub struct LogSink;

impl ErrorSink for LogSink {
    fn record(&self, error: &ScheduleError) {
        tracing::error!(kind = error.kind(), error = %error, "watchdog scheduling error");
    }
}

/// Persists errors to the resurface SQLite database.
///
/// Opens the database per record; scheduling errors are rare enough that
/// holding a connection open buys nothing. A failed write degrades to a log
/// line — the sink itself must never take the daemon down.
pub struct DbSink {
    db_path: PathBuf,
}

impl DbSink {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl ErrorSink for DbSink {
    fn record(&self, error: &ScheduleError) {
        tracing::error!(kind = error.kind(), error = %error, "watchdog scheduling error");

        let result = db::open_or_create(&self.db_path)
            .and_then(|conn| db::insert_error(&conn, error.kind(), &error.to_string()));
        match result {
            Ok(id) => {
                tracing::debug!(id, path = %self.db_path.display(), "scheduling error persisted");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.db_path.display(),
                    "failed to persist scheduling error"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_sink_records_without_panicking() {
        LogSink.record(&ScheduleError::RuntimeUnavailable);
    }

    #[test]
    fn db_sink_persists_error_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resurface.db");

        let sink = DbSink::new(&path);
        sink.record(&ScheduleError::InvalidInterval { millis: 0 });

        let conn = db::open_or_create(&path).unwrap();
        let rows = db::list_errors(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "invalid_interval");
        assert!(rows[0].detail.contains("0ms"));
    }

    #[test]
    fn db_sink_appends_on_repeat_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resurface.db");

        let sink = DbSink::new(&path);
        sink.record(&ScheduleError::InvalidInterval { millis: 0 });
        sink.record(&ScheduleError::RuntimeUnavailable);

        let conn = db::open_or_create(&path).unwrap();
        let rows = db::list_errors(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].kind, "runtime_unavailable");
    }

    #[test]
    fn db_sink_write_failure_degrades_to_log() {
        // Unwritable location: the record call must not panic.
        let sink = DbSink::new("/nonexistent-dir/impossible/resurface.db");
        sink.record(&ScheduleError::RuntimeUnavailable);
    }
}
