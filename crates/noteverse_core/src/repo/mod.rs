//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contracts the services are written against.
//! - Isolate SQLite query details from service/business orchestration.
//! - Normalize storage id encodings into `NoteId` / `UserId`.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Set updates on note likes are single atomic store operations.

pub mod note_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::ids::{NoteId, UserId};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A uniqueness constraint rejected the write.
    Conflict(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Conflict(message) => write!(f, "conflicting write: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "database is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "table `{table}` is missing required column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

pub(crate) fn parse_note_id(value: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value)
        .ok()
        .and_then(NoteId::from_uuid)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid note id `{value}`")))
}

pub(crate) fn parse_user_id(value: &str) -> RepoResult<UserId> {
    Uuid::parse_str(value)
        .ok()
        .and_then(UserId::from_uuid)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid user id `{value}`")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

/// Verifies that `table` exists and carries every listed column.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let present = table_columns(conn, table)?;
    if present.is_empty() {
        return Err(RepoError::MissingRequiredTable(table));
    }
    match columns.iter().find(|column| !present.contains(**column)) {
        Some(&column) => Err(RepoError::MissingRequiredColumn { table, column }),
        None => Ok(()),
    }
}

/// Column names of `table`; empty when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> RepoResult<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(names)
}
