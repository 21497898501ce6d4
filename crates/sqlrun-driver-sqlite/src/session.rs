//! SQLite session implementation

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use sqlrun_core::{ConnectionError, ExecutionError, Result, Session, SqlRunError, Unit};

/// A live SQLite connection executing units one at a time.
///
/// Every unit that succeeds is durable before the next one starts; a
/// unit that fails rolls back whatever transaction it left open, so the
/// session stays usable for the rest of the run.
pub struct SqliteSession {
    conn: Mutex<RusqliteConnection>,
    closed: AtomicBool,
}

impl SqliteSession {
    /// Open a SQLite database at `path`, or an in-memory one for `:memory:`.
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SqlRunError::Connection(ConnectionError::new(format!(
                    "failed to open in-memory database: {e}"
                )))
            })?
        } else {
            // A bare file name has an empty parent; only reject paths
            // pointing into a missing directory.
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                return Err(SqlRunError::Connection(ConnectionError::new(format!(
                    "parent directory does not exist: {}",
                    parent.display()
                ))));
            }

            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
            RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
                SqlRunError::Connection(ConnectionError::new(format!(
                    "failed to open SQLite database at '{path}': {e}"
                )))
            })?
        };

        // PRAGMA commands return results, so use pragma_update.
        conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
            SqlRunError::Connection(ConnectionError::new(format!(
                "failed to enable foreign keys: {e}"
            )))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            closed: AtomicBool::new(false),
        })
    }

    /// Cheap liveness probe used when testing connection settings.
    pub(crate) fn probe(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_row| Ok(()))
            .map_err(|e| SqlRunError::Connection(ConnectionError::new(e.to_string())))
    }
}

#[async_trait]
impl Session for SqliteSession {
    #[tracing::instrument(
        skip(self, unit),
        fields(ordinal = unit.ordinal, kind = ?unit.kind, sql_preview = %unit.text.chars().take(100).collect::<String>())
    )]
    async fn execute_unit(&self, unit: &Unit) -> Result<()> {
        if self.is_closed() {
            return Err(SqlRunError::Execution(ExecutionError::new(
                "session is closed",
            )));
        }

        let conn = self.conn.lock();

        if let Err(e) = conn.execute_batch(&unit.text) {
            // A failed unit must not leave an open transaction behind.
            if !conn.is_autocommit()
                && let Err(rollback_err) = conn.execute_batch("ROLLBACK")
            {
                tracing::warn!(error = %rollback_err, "rollback after failed unit also failed");
            }
            return Err(SqlRunError::Execution(execution_error(&e)));
        }

        // Commit whatever the unit left pending; each unit must be
        // durable before the next one starts.
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")
                .map_err(|e| SqlRunError::Execution(execution_error(&e)))?;
        }

        tracing::debug!("unit executed and committed");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The underlying handle is released when the session drops;
        // close only fences off further execution.
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing SQLite session");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Map a rusqlite failure to the code/message pair recorded for a unit.
fn execution_error(error: &rusqlite::Error) -> ExecutionError {
    match error {
        rusqlite::Error::SqliteFailure(ffi_error, message) => {
            let text = message.clone().unwrap_or_else(|| ffi_error.to_string());
            ExecutionError::new(text).with_code(format!("SQLITE-{}", ffi_error.extended_code))
        }
        other => ExecutionError::new(other.to_string()),
    }
}
