use recall_core::db::migrations::latest_version;
use recall_core::db::{open_db, open_db_in_memory, schema_version, DbError};
use recall_core::{RepoError, SqliteNoteStore};
use rusqlite::Connection;

#[test]
fn in_memory_database_has_note_and_tag_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    for table in ["notes", "tags", "note_tags"] {
        assert!(has_table(&conn, table), "missing table {table}");
    }
}

#[test]
fn reopening_a_file_keeps_its_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recall.sqlite3");

    {
        let store = SqliteNoteStore::try_new(open_db(&path).unwrap()).unwrap();
        store
            .create_note(&recall_core::NewNote::new("ownership", "moves and borrows"))
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn file_database_creates_parent_dirs_and_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/recall.sqlite3");

    let conn = open_db(&path).unwrap();
    assert!(path.exists());
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 999;")
        .unwrap();

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteNoteStore::try_new(conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("notes")));
}

fn has_table(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [name],
        |row| row.get(0),
    )
    .unwrap()
}
