use rusqlite::{Connection, Result};
use std::path::Path;

/// Opens (or creates) the resurface SQLite database at the given path.
///
/// Creates the watchdog_errors table and index if they don't already exist.
/// Returns an open connection ready for use.
pub fn open_or_create(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;

    // Enable WAL mode for better concurrent read performance
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS watchdog_errors (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            created    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            kind       TEXT NOT NULL,
            detail     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_watchdog_errors_kind ON watchdog_errors(kind);",
    )?;

    Ok(conn)
}

/// Insert a scheduling error record. Returns the row id.
pub fn insert_error(conn: &Connection, kind: &str, detail: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO watchdog_errors (kind, detail) VALUES (?1, ?2)",
        rusqlite::params![kind, detail],
    )?;
    Ok(conn.last_insert_rowid())
}

/// A row from the watchdog_errors table.
#[derive(Debug)]
pub struct ErrorRecord {
    pub id: i64,
    pub created: String,
    pub kind: String,
    pub detail: String,
}

/// List recorded errors, oldest first.
pub fn list_errors(conn: &Connection) -> Result<Vec<ErrorRecord>> {
    let mut stmt =
        conn.prepare("SELECT id, created, kind, detail FROM watchdog_errors ORDER BY id ASC")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ErrorRecord {
                id: row.get(0)?,
                created: row.get(1)?,
                kind: row.get(2)?,
                detail: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resurface.db");
        let conn = open_or_create(&path).unwrap();
        (dir, conn)
    }

    #[test]
    fn creates_database_and_table() {
        let (_dir, conn) = test_db();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM watchdog_errors", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn idempotent_creation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resurface.db");

        let conn1 = open_or_create(&path).unwrap();
        drop(conn1);
        let conn2 = open_or_create(&path).unwrap();

        let count: i64 = conn2
            .query_row("SELECT COUNT(*) FROM watchdog_errors", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn insert_and_list_round_trip() {
        let (_dir, conn) = test_db();

        let id = insert_error(&conn, "invalid_interval", "invalid poll interval: 0ms").unwrap();
        assert_eq!(id, 1);

        let rows = list_errors(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "invalid_interval");
        assert_eq!(rows[0].detail, "invalid poll interval: 0ms");
    }

    #[test]
    fn created_timestamp_auto_set() {
        let (_dir, conn) = test_db();

        insert_error(&conn, "runtime_unavailable", "no async runtime").unwrap();

        let created = &list_errors(&conn).unwrap()[0].created;
        // Should be a valid ISO timestamp
        assert!(created.contains('T'));
        assert!(created.ends_with('Z'));
    }

    #[test]
    fn errors_listed_oldest_first() {
        let (_dir, conn) = test_db();

        insert_error(&conn, "invalid_interval", "first").unwrap();
        insert_error(&conn, "runtime_unavailable", "second").unwrap();

        let rows = list_errors(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].detail, "first");
        assert_eq!(rows[1].detail, "second");
        assert!(rows[0].id < rows[1].id);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resurface.db");

        {
            let conn = open_or_create(&path).unwrap();
            insert_error(&conn, "invalid_interval", "persisted").unwrap();
        }

        {
            let conn = open_or_create(&path).unwrap();
            let rows = list_errors(&conn).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].detail, "persisted");
        }
    }
}
