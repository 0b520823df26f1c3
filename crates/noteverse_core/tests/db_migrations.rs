use noteverse_core::db::migrations::latest_version;
use noteverse_core::db::{open_db, open_db_in_memory, schema_version, DbError};
use noteverse_core::{RepoError, SqliteNoteRepository, SqliteUserRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    for table in ["users", "notes", "note_files", "note_likes"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn foreign_keys_are_enabled_on_open() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reopening_file_database_keeps_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noteverse.sqlite3");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first).unwrap(), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    assert_table_exists(&second, "note_likes");
}

#[test]
fn database_from_newer_binary_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_refuse_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteNoteRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("notes"))
    ));
    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("users"))
    ));
}

#[test]
fn note_rows_reject_unknown_branch() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO notes (uuid, title, content, is_public, branch, year, subject, author_uuid, created_at, updated_at)
         VALUES ('n1', 't', 'c', 1, 'xx', '1', 's', 'a1', 0, 0);",
        [],
    );
    assert!(result.is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
