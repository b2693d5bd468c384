//! Opening note databases.
//!
//! Every connection returned here has `foreign_keys=ON`, a busy timeout and
//! the full schema. File databases additionally run in WAL mode so the due
//! poller can read while a review is being written from another process.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the note database at `path`.
///
/// Missing parent directories are created. Emits `db_open` events with the
/// resulting schema version.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let result = ensure_parent_dir(path)
        .and_then(|()| Connection::open(path).map_err(DbError::from))
        .and_then(|mut conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            prepare(&mut conn).map(|version| (conn, version))
        });
    report("file", started_at, result)
}

/// Opens a private in-memory note database, used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| prepare(&mut conn).map(|version| (conn, version)));
    report("memory", started_at, result)
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Applies connection settings and migrations; returns the schema version.
fn prepare(conn: &mut Connection) -> DbResult<u32> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}

fn report(
    target: &str,
    started_at: Instant,
    result: DbResult<(Connection, u32)>,
) -> DbResult<Connection> {
    match result {
        Ok((conn, version)) => {
            info!(
                "event=db_open module=db status=ok target={} schema_version={} duration_ms={}",
                target,
                version,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error target={} duration_ms={} error={}",
                target,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
