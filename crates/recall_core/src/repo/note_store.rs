//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the read/patch contract the review engine consumes.
//! - Provide the CRUD operations needed to populate the engine (create,
//!   edit, replace tags, archive, delete).
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Review patches never push `review_level` above `MAX_REVIEW_LEVEL`.
//! - A due query only ever returns non-archived, non-mastered notes.
//! - Tag order per note is preserved through the `note_tags.position` column.
//! - Every store call runs under the connection mutex, so each call is atomic
//!   with respect to other calls on the same store.
//! - `update_review_with` reads and writes inside one `IMMEDIATE` transaction,
//!   so it is also atomic against other connections to the same file.
//! - Tags are stored as written (trimmed); `Rust` and `rust` are two tags.

use crate::db::DbError;
use crate::model::note::{
    NewNote, Note, NoteId, NoteValidationError, MAX_REVIEW_LEVEL, TAG_MAX_CHARS,
};
use crate::time::{now_epoch_ms, HOUR_MS};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    is_archived,
    review_level,
    review_count,
    next_review_at,
    created_at,
    updated_at
FROM notes";

/// Delay before a freshly created note is first due.
pub const FIRST_REVIEW_DELAY_MS: i64 = HOUR_MS;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for note store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    /// A previous holder of the connection panicked mid-operation.
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "note database is missing table `{table}`")
            }
            Self::LockPoisoned => write!(f, "note store connection lock is poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result ordering for note queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteOrder {
    /// Most recently edited first.
    #[default]
    UpdatedDesc,
    /// Most overdue first.
    NextReviewAsc,
}

/// Predicate + ordering for `NoteStore::find_notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub include_archived: bool,
    /// When set, restricts to notes due at this instant: not archived,
    /// `next_review_date <= due_at` and not mastered.
    pub due_at: Option<i64>,
    /// Exact, case-sensitive tag filter; surrounding whitespace is ignored.
    pub tag: Option<String>,
    pub order: NoteOrder,
    pub limit: Option<u32>,
}

impl NoteQuery {
    /// Every non-archived note, most recently edited first.
    pub fn active() -> Self {
        Self::default()
    }

    /// The due set at `now_ms`, most overdue first.
    pub fn due_at(now_ms: i64) -> Self {
        Self {
            include_archived: false,
            due_at: Some(now_ms),
            tag: None,
            order: NoteOrder::NextReviewAsc,
            limit: None,
        }
    }
}

/// Review-state fields written by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPatch {
    pub review_level: u8,
    pub review_count: u32,
    pub next_review_date: i64,
    /// Clock reading the patch was computed at; stored as `updated_at`.
    pub updated_at: i64,
}

/// Storage contract consumed by the review engine.
///
/// Implementations must be shareable across threads: request handlers and
/// the background poller hold the same store.
pub trait NoteStore: Send + Sync {
    /// Returns notes matching `query`, ordered as requested.
    fn find_notes(&self, query: &NoteQuery) -> RepoResult<Vec<Note>>;
    /// Gets one note by id, archived or not.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Writes review fields and returns the updated note.
    ///
    /// Returns `RepoError::NotFound` when `id` does not exist.
    fn update_review(&self, id: NoteId, patch: &ReviewPatch) -> RepoResult<Note>;
    /// Reads `id`, derives a patch from it with `next` and writes the patch as
    /// one atomic step: no other writer can change the note in between.
    ///
    /// Returns `RepoError::NotFound` when `id` does not exist.
    fn update_review_with(
        &self,
        id: NoteId,
        next: &mut dyn FnMut(&Note) -> ReviewPatch,
    ) -> RepoResult<Note>;
}

/// SQLite-backed note store.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

impl SqliteNoteStore {
    /// Wraps a migrated connection (see `db::open_db`).
    ///
    /// # Errors
    /// - `RepoError::MissingRequiredTable` when migrations were not applied.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates a note at review level 0, first due one hour from now.
    pub fn create_note(&self, input: &NewNote) -> RepoResult<Note> {
        self.create_note_at(input, now_epoch_ms())
    }

    /// Same as `create_note` with an explicit clock reading.
    pub fn create_note_at(&self, input: &NewNote, now_ms: i64) -> RepoResult<Note> {
        input.validate()?;
        let id = Uuid::new_v4();
        let tags = normalize_tags(&input.tags);

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notes (
                uuid,
                title,
                content,
                is_archived,
                review_level,
                review_count,
                next_review_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, 0, 0, 0, ?4, ?5, ?5);",
            params![
                id.to_string(),
                input.title.trim(),
                input.content.as_str(),
                now_ms.saturating_add(FIRST_REVIEW_DELAY_MS),
                now_ms,
            ],
        )?;
        replace_tags_in_tx(&tx, &id.to_string(), &tags)?;
        tx.commit()?;

        load_note(&conn, id)?.ok_or(RepoError::NotFound(id))
    }

    /// Replaces title, content and tags of one note. Review state and the
    /// archive flag are left alone.
    pub fn update_note(&self, id: NoteId, input: &NewNote) -> RepoResult<Note> {
        self.update_note_at(id, input, now_epoch_ms())
    }

    /// Same as `update_note` with an explicit clock reading.
    pub fn update_note_at(&self, id: NoteId, input: &NewNote, now_ms: i64) -> RepoResult<Note> {
        input.validate()?;
        let tags = normalize_tags(&input.tags);

        let mut conn = self.lock()?;
        let id_text = id.to_string();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                updated_at = ?4
             WHERE uuid = ?1;",
            params![id_text, input.title.trim(), input.content.as_str(), now_ms],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        replace_tags_in_tx(&tx, &id_text, &tags)?;
        tx.commit()?;

        load_note(&conn, id)?.ok_or(RepoError::NotFound(id))
    }

    /// Deletes one note and its tag links.
    pub fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Replaces the full tag set of one note atomically.
    ///
    /// Tags are trimmed; blanks are dropped and exact duplicates keep their
    /// first position. Case is preserved.
    pub fn set_note_tags(&self, id: NoteId, tags: &[String]) -> RepoResult<Note> {
        let normalized = normalize_tags(tags);
        if let Some(tag) = normalized
            .iter()
            .find(|tag| tag.chars().count() > TAG_MAX_CHARS)
        {
            return Err(NoteValidationError::TagTooLong(tag.clone()).into());
        }

        let mut conn = self.lock()?;
        let id_text = id.to_string();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !note_exists_in_tx(&tx, &id_text)? {
            return Err(RepoError::NotFound(id));
        }
        replace_tags_in_tx(&tx, &id_text, &normalized)?;
        touch_in_tx(&tx, &id_text, now_epoch_ms())?;
        tx.commit()?;

        load_note(&conn, id)?.ok_or(RepoError::NotFound(id))
    }

    /// Archives or restores one note. Archived notes leave the due set and the
    /// tag graph but keep their review state.
    pub fn set_archived(&self, id: NoteId, archived: bool) -> RepoResult<Note> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE notes
             SET
                is_archived = ?2,
                updated_at = ?3
             WHERE uuid = ?1;",
            params![id.to_string(), bool_to_int(archived), now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        load_note(&conn, id)?.ok_or(RepoError::NotFound(id))
    }

    /// Returns tag names attached to at least one note, sorted
    /// case-insensitively.
    pub fn list_tags(&self) -> RepoResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name
             FROM tags
             WHERE EXISTS (SELECT 1 FROM note_tags nt WHERE nt.tag_id = tags.id)
             ORDER BY name COLLATE NOCASE ASC, name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(row.get::<_, String>("name")?);
        }
        Ok(tags)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl NoteStore for SqliteNoteStore {
    fn find_notes(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_archived || query.due_at.is_some() {
            sql.push_str(" AND is_archived = 0");
        }

        if let Some(now_ms) = query.due_at {
            sql.push_str(" AND next_review_at <= ? AND review_level < ?");
            bind_values.push(Value::Integer(now_ms));
            bind_values.push(Value::Integer(i64::from(MAX_REVIEW_LEVEL)));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    INNER JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_uuid = notes.uuid
                      AND t.name = ?
                )",
            );
            bind_values.push(Value::Text(tag.trim().to_string()));
        }

        match query.order {
            NoteOrder::UpdatedDesc => sql.push_str(" ORDER BY updated_at DESC, uuid ASC"),
            NoteOrder::NextReviewAsc => sql.push_str(" ORDER BY next_review_at ASC, uuid ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(&conn, row)?);
        }
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let conn = self.lock()?;
        load_note(&conn, id)
    }

    fn update_review(&self, id: NoteId, patch: &ReviewPatch) -> RepoResult<Note> {
        let conn = self.lock()?;
        write_review(&conn, id, patch)?;
        load_note(&conn, id)?.ok_or(RepoError::NotFound(id))
    }

    fn update_review_with(
        &self,
        id: NoteId,
        next: &mut dyn FnMut(&Note) -> ReviewPatch,
    ) -> RepoResult<Note> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, so a second connection
        // (e.g. another `recall` process) waits here instead of reading a
        // level that is about to change.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_note(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        write_review(&tx, id, &next(&current))?;
        tx.commit()?;

        load_note(&conn, id)?.ok_or(RepoError::NotFound(id))
    }
}

/// Normalizes one tag value: trimmed, `None` when blank. Case is kept.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes tags and drops exact duplicates, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .filter_map(|tag| normalize_tag(tag))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

fn write_review(conn: &Connection, id: NoteId, patch: &ReviewPatch) -> RepoResult<()> {
    if patch.review_level > MAX_REVIEW_LEVEL {
        return Err(NoteValidationError::ReviewLevelOutOfRange(patch.review_level).into());
    }
    let changed = conn.execute(
        "UPDATE notes
         SET
            review_level = ?2,
            review_count = ?3,
            next_review_at = ?4,
            updated_at = ?5
         WHERE uuid = ?1;",
        params![
            id.to_string(),
            i64::from(patch.review_level),
            i64::from(patch.review_count),
            patch.next_review_date,
            patch.updated_at,
        ],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

fn load_note(conn: &Connection, id: NoteId) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(conn, row)?));
    }
    Ok(None)
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in notes.uuid"))
    })?;

    let is_archived = match row.get::<_, i64>("is_archived")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_archived value `{other}` in notes.is_archived"
            )));
        }
    };

    let level_raw: i64 = row.get("review_level")?;
    let review_level = u8::try_from(level_raw)
        .ok()
        .filter(|level| *level <= MAX_REVIEW_LEVEL)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid review level `{level_raw}` in notes.review_level"
            ))
        })?;

    let count_raw: i64 = row.get("review_count")?;
    let review_count = u32::try_from(count_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid review count `{count_raw}` in notes.review_count"
        ))
    })?;

    Ok(Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        tags: load_tags_for_note(conn, &uuid_text)?,
        is_archived,
        review_level,
        review_count,
        next_review_date: row.get("next_review_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_tags_for_note(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_uuid = ?1
         ORDER BY nt.position ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

fn replace_tags_in_tx(tx: &Transaction<'_>, note_uuid: &str, tags: &[String]) -> RepoResult<()> {
    tx.execute("DELETE FROM note_tags WHERE note_uuid = ?1;", [note_uuid])?;
    for (position, tag) in tags.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        tx.execute(
            "INSERT INTO note_tags (note_uuid, tag_id, position)
             SELECT ?1, id, ?3
             FROM tags
             WHERE name = ?2;",
            params![note_uuid, tag.as_str(), position as i64],
        )?;
    }
    Ok(())
}

fn touch_in_tx(tx: &Transaction<'_>, note_uuid: &str, now_ms: i64) -> RepoResult<()> {
    tx.execute(
        "UPDATE notes SET updated_at = ?2 WHERE uuid = ?1;",
        params![note_uuid, now_ms],
    )?;
    Ok(())
}

fn note_exists_in_tx(tx: &Transaction<'_>, note_uuid: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE uuid = ?1);",
        [note_uuid],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["notes", "tags", "note_tags"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag, normalize_tags};

    #[test]
    fn normalize_tag_trims_but_keeps_case() {
        assert_eq!(normalize_tag("  React "), Some("React".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn normalize_tags_drops_only_exact_duplicates() {
        let tags = vec![
            "Work".to_string(),
            "personal".to_string(),
            " Work".to_string(),
            "WORK".to_string(),
            " ".to_string(),
        ];
        assert_eq!(
            normalize_tags(&tags),
            vec![
                "Work".to_string(),
                "personal".to_string(),
                "WORK".to_string()
            ]
        );
    }
}
