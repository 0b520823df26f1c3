//! Note store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes with their attachment references and like sets.
//! - Translate list visibility and filters into SQL.
//! - Provide atomic like-set and privacy flips.
//!
//! # Invariants
//! - Lists are ordered by `created_at DESC, uuid ASC`.
//! - Every mutation refreshes `updated_at` to `max(now, created_at)`.
//! - Like toggles run inside one immediate write transaction, so concurrent
//!   toggles by different users never overwrite each other.
//! - Deleting a note removes its files and likes (foreign key cascade).

use crate::access::Visibility;
use crate::model::draft::ValidNote;
use crate::model::ids::{NoteId, UserId};
use crate::model::note::{Branch, FileRef, LikeState, Note, Year};
use crate::model::now_epoch_ms;
use crate::repo::{
    bool_to_int, ensure_table_ready, int_to_bool, parse_note_id, parse_user_id, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::collections::BTreeSet;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    is_public,
    branch,
    year,
    subject,
    author_uuid,
    created_at,
    updated_at
FROM notes";

/// Structured filters for note lists. Visibility is passed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    /// Exact author match.
    pub author: Option<UserId>,
    /// Only notes whose like set contains this user.
    pub liked_by: Option<UserId>,
    pub branch: Option<Branch>,
    pub year: Option<Year>,
    /// Case-insensitive substring of `subject`.
    pub subject: Option<String>,
    /// Case-insensitive substring of `title`, `content` or `subject`.
    pub search: Option<String>,
}

impl NoteQuery {
    /// Applies the free-text filters (`subject`, `search`).
    pub fn matches_text(&self, title: &str, content: &str, subject: &str) -> bool {
        let subject_lower = subject.to_lowercase();
        if let Some(needle) = self.subject.as_deref() {
            if !subject_lower.contains(&needle.to_lowercase()) {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(needle) => {
                let needle = needle.to_lowercase();
                title.to_lowercase().contains(&needle)
                    || content.to_lowercase().contains(&needle)
                    || subject_lower.contains(&needle)
            }
            None => true,
        }
    }
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
    pub branch: Option<Branch>,
    pub year: Option<Year>,
    pub subject: Option<String>,
    /// Replaces the whole attachment list when set.
    pub files: Option<Vec<FileRef>>,
}

impl From<ValidNote> for NotePatch {
    fn from(value: ValidNote) -> Self {
        Self {
            title: Some(value.title),
            content: Some(value.content),
            is_public: value.is_public,
            branch: Some(value.branch),
            year: Some(value.year),
            subject: Some(value.subject),
            files: value.files,
        }
    }
}

/// Store interface for notes.
pub trait NoteRepository {
    /// Inserts a complete note record and returns its id.
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId>;
    fn find_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists notes admitted by `visibility` and matching `query`, newest first.
    fn find_notes(&self, query: &NoteQuery, visibility: Visibility) -> RepoResult<Vec<Note>>;
    /// Applies `patch` and returns the updated note, or `None` when missing.
    fn update_note_by_id(&self, id: NoteId, patch: &NotePatch) -> RepoResult<Option<Note>>;
    /// Returns `false` when no note had this id.
    fn delete_note_by_id(&self, id: NoteId) -> RepoResult<bool>;
    /// Adds `user` to the like set. `None` when the note is missing,
    /// otherwise whether the set changed.
    fn add_like(&self, id: NoteId, user: UserId) -> RepoResult<Option<bool>>;
    /// Removes `user` from the like set. Same return contract as `add_like`.
    fn remove_like(&self, id: NoteId, user: UserId) -> RepoResult<Option<bool>>;
    /// Atomically flips `user` in the like set.
    fn toggle_like(&self, id: NoteId, user: UserId) -> RepoResult<Option<LikeState>>;
    /// Atomically flips `is_public` and returns the new value.
    fn toggle_public(&self, id: NoteId) -> RepoResult<Option<bool>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn write_tx(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        let tx = self.write_tx()?;
        let note_id = note.id.to_string();
        tx.execute(
            "INSERT INTO notes (
                uuid,
                title,
                content,
                is_public,
                branch,
                year,
                subject,
                author_uuid,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                note_id,
                note.title.as_str(),
                note.content.as_str(),
                bool_to_int(note.is_public),
                note.branch.as_str(),
                note.year.as_str(),
                note.subject.as_str(),
                note.author_id.to_string(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        write_files(&tx, &note_id, &note.files)?;
        for user in &note.likes {
            tx.execute(
                "INSERT INTO note_likes (note_uuid, user_uuid, liked_at) VALUES (?1, ?2, ?3);",
                params![note_id, user.to_string(), note.updated_at],
            )?;
        }
        tx.commit()?;
        Ok(note.id)
    }

    fn find_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        load_note(self.conn, &id.to_string())
    }

    fn find_notes(&self, query: &NoteQuery, visibility: Visibility) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match visibility {
            Visibility::PublicOnly => sql.push_str(" AND is_public = 1"),
            Visibility::PublicOrAuthoredBy(user) => {
                sql.push_str(" AND (is_public = 1 OR author_uuid = ?)");
                bind_values.push(Value::Text(user.to_string()));
            }
            Visibility::Unrestricted => {}
        }

        if let Some(author) = query.author {
            sql.push_str(" AND author_uuid = ?");
            bind_values.push(Value::Text(author.to_string()));
        }
        if let Some(user) = query.liked_by {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_likes nl
                    WHERE nl.note_uuid = notes.uuid
                      AND nl.user_uuid = ?
                )",
            );
            bind_values.push(Value::Text(user.to_string()));
        }
        if let Some(branch) = query.branch {
            sql.push_str(" AND branch = ?");
            bind_values.push(Value::Text(branch.as_str().to_string()));
        }
        if let Some(year) = query.year {
            sql.push_str(" AND year = ?");
            bind_values.push(Value::Text(year.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let note = parse_note_row(row)?;
            // SQLite LIKE folds ASCII only; text filters run here for full
            // Unicode case folding.
            if !query.matches_text(&note.title, &note.content, &note.subject) {
                continue;
            }
            notes.push(note);
        }
        drop(rows);

        for note in &mut notes {
            hydrate_note(self.conn, note)?;
        }
        Ok(notes)
    }

    fn update_note_by_id(&self, id: NoteId, patch: &NotePatch) -> RepoResult<Option<Note>> {
        let note_id = id.to_string();
        let tx = self.write_tx()?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                is_public = COALESCE(?4, is_public),
                branch = COALESCE(?5, branch),
                year = COALESCE(?6, year),
                subject = COALESCE(?7, subject),
                updated_at = MAX(?8, created_at)
             WHERE uuid = ?1;",
            params![
                note_id,
                patch.title.as_deref(),
                patch.content.as_deref(),
                patch.is_public.map(bool_to_int),
                patch.branch.map(Branch::as_str),
                patch.year.map(Year::as_str),
                patch.subject.as_deref(),
                now_epoch_ms(),
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        if let Some(files) = patch.files.as_ref() {
            tx.execute("DELETE FROM note_files WHERE note_uuid = ?1;", [&note_id])?;
            write_files(&tx, &note_id, files)?;
        }

        let updated = load_note(&tx, &note_id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_note_by_id(&self, id: NoteId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn add_like(&self, id: NoteId, user: UserId) -> RepoResult<Option<bool>> {
        let note_id = id.to_string();
        let tx = self.write_tx()?;
        if !note_exists(&tx, &note_id)? {
            return Ok(None);
        }
        let now = now_epoch_ms();
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO note_likes (note_uuid, user_uuid, liked_at)
             VALUES (?1, ?2, ?3);",
            params![note_id, user.to_string(), now],
        )?;
        if inserted > 0 {
            touch_note(&tx, &note_id, now)?;
        }
        tx.commit()?;
        Ok(Some(inserted > 0))
    }

    fn remove_like(&self, id: NoteId, user: UserId) -> RepoResult<Option<bool>> {
        let note_id = id.to_string();
        let tx = self.write_tx()?;
        if !note_exists(&tx, &note_id)? {
            return Ok(None);
        }
        let removed = tx.execute(
            "DELETE FROM note_likes WHERE note_uuid = ?1 AND user_uuid = ?2;",
            params![note_id, user.to_string()],
        )?;
        if removed > 0 {
            touch_note(&tx, &note_id, now_epoch_ms())?;
        }
        tx.commit()?;
        Ok(Some(removed > 0))
    }

    fn toggle_like(&self, id: NoteId, user: UserId) -> RepoResult<Option<LikeState>> {
        let note_id = id.to_string();
        let user_id = user.to_string();
        let tx = self.write_tx()?;
        if !note_exists(&tx, &note_id)? {
            return Ok(None);
        }

        let now = now_epoch_ms();
        let removed = tx.execute(
            "DELETE FROM note_likes WHERE note_uuid = ?1 AND user_uuid = ?2;",
            params![note_id, user_id],
        )?;
        let state = if removed > 0 {
            LikeState::NotLiked
        } else {
            tx.execute(
                "INSERT INTO note_likes (note_uuid, user_uuid, liked_at) VALUES (?1, ?2, ?3);",
                params![note_id, user_id, now],
            )?;
            LikeState::Liked
        };
        touch_note(&tx, &note_id, now)?;
        tx.commit()?;
        Ok(Some(state))
    }

    fn toggle_public(&self, id: NoteId) -> RepoResult<Option<bool>> {
        let is_public: Option<i64> = self
            .conn
            .query_row(
                "UPDATE notes
                 SET
                    is_public = 1 - is_public,
                    updated_at = MAX(?2, created_at)
                 WHERE uuid = ?1
                 RETURNING is_public;",
                params![id.to_string(), now_epoch_ms()],
                |row| row.get(0),
            )
            .optional()?;
        is_public
            .map(|value| int_to_bool(value, "notes.is_public"))
            .transpose()
    }
}

fn load_note(conn: &Connection, note_id: &str) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([note_id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut note = parse_note_row(row)?;
    drop(rows);
    hydrate_note(conn, &mut note)?;
    Ok(Some(note))
}

/// Parses the scalar columns; `files` and `likes` start empty.
fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let author_text: String = row.get("author_uuid")?;

    let branch_text: String = row.get("branch")?;
    let branch = Branch::parse(&branch_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid branch `{branch_text}` in notes.branch"))
    })?;
    let year_text: String = row.get("year")?;
    let year = Year::parse(&year_text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid year `{year_text}` in notes.year")))?;

    Ok(Note {
        id: parse_note_id(&uuid_text)?,
        title: row.get("title")?,
        content: row.get("content")?,
        is_public: int_to_bool(row.get("is_public")?, "notes.is_public")?,
        branch,
        year,
        subject: row.get("subject")?,
        files: Vec::new(),
        author_id: parse_user_id(&author_text)?,
        likes: BTreeSet::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn hydrate_note(conn: &Connection, note: &mut Note) -> RepoResult<()> {
    let note_id = note.id.to_string();
    note.files = load_files(conn, &note_id)?;
    note.likes = load_likes(conn, &note_id)?;
    Ok(())
}

fn load_files(conn: &Connection, note_id: &str) -> RepoResult<Vec<FileRef>> {
    let mut stmt = conn.prepare(
        "SELECT name, url, mime_type, size
         FROM note_files
         WHERE note_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut files = Vec::new();
    while let Some(row) = rows.next()? {
        let size: i64 = row.get("size")?;
        files.push(FileRef {
            name: row.get("name")?,
            url: row.get("url")?,
            file_type: row.get("mime_type")?,
            size: u64::try_from(size).map_err(|_| {
                RepoError::InvalidData(format!("invalid size `{size}` in note_files.size"))
            })?,
        });
    }
    Ok(files)
}

fn load_likes(conn: &Connection, note_id: &str) -> RepoResult<BTreeSet<UserId>> {
    let mut stmt = conn.prepare("SELECT user_uuid FROM note_likes WHERE note_uuid = ?1;")?;
    let mut rows = stmt.query([note_id])?;
    let mut likes = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        likes.insert(parse_user_id(&value)?);
    }
    Ok(likes)
}

fn write_files(conn: &Connection, note_id: &str, files: &[FileRef]) -> RepoResult<()> {
    for (position, file) in files.iter().enumerate() {
        let size = i64::try_from(file.size).map_err(|_| {
            RepoError::InvalidData(format!("file size {} exceeds storage range", file.size))
        })?;
        conn.execute(
            "INSERT INTO note_files (note_uuid, position, name, url, mime_type, size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note_id,
                i64::try_from(position).unwrap_or(i64::MAX),
                file.name.as_str(),
                file.url.as_str(),
                file.file_type.as_str(),
                size,
            ],
        )?;
    }
    Ok(())
}

fn note_exists(conn: &Connection, note_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE uuid = ?1);",
        [note_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn touch_note(conn: &Connection, note_id: &str, now: i64) -> RepoResult<()> {
    conn.execute(
        "UPDATE notes SET updated_at = MAX(?2, created_at) WHERE uuid = ?1;",
        params![note_id, now],
    )?;
    Ok(())
}

fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    ensure_table_ready(
        conn,
        "notes",
        &[
            "uuid",
            "title",
            "content",
            "is_public",
            "branch",
            "year",
            "subject",
            "author_uuid",
            "created_at",
            "updated_at",
        ],
    )?;
    ensure_table_ready(
        conn,
        "note_files",
        &["note_uuid", "position", "name", "url", "mime_type", "size"],
    )?;
    ensure_table_ready(conn, "note_likes", &["note_uuid", "user_uuid", "liked_at"])
}

#[cfg(test)]
mod tests {
    use super::NoteQuery;

    #[test]
    fn search_matches_title_content_or_subject_ignoring_case() {
        let query = NoteQuery {
            search: Some("FOURIER".to_string()),
            ..NoteQuery::default()
        };
        assert!(query.matches_text("Fourier series", "", "maths"));
        assert!(query.matches_text("x", "the fourier transform", "maths"));
        assert!(query.matches_text("x", "y", "Fourier Analysis"));
        assert!(!query.matches_text("x", "y", "z"));
    }

    #[test]
    fn subject_filter_is_case_insensitive_substring() {
        let query = NoteQuery {
            subject: Some("struct".to_string()),
            ..NoteQuery::default()
        };
        assert!(query.matches_text("t", "c", "Data Structures"));
        assert!(!query.matches_text("structures", "c", "Algorithms"));
    }

    #[test]
    fn text_filters_fold_non_ascii_case() {
        let query = NoteQuery {
            search: Some("ÜBUNG".to_string()),
            ..NoteQuery::default()
        };
        assert!(query.matches_text("Übung 3", "", ""));
    }
}
