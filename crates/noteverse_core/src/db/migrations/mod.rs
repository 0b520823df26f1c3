//! Schema migrations, applied in version order inside one transaction.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one.
//! - `PRAGMA user_version` always equals the last applied version.
//! - Note likes live in their own table keyed by `(note_uuid, user_uuid)`.

use crate::db::{schema_version, DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "note_likes",
        sql: include_str!("0002_note_likes.sql"),
    },
];

/// Newest schema version this binary can create.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer binary.
/// - `Sqlite` when any statement fails; nothing is applied in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    for migration in pending {
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, MIGRATIONS};

    #[test]
    fn versions_are_contiguous_from_one() {
        for (idx, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, idx + 1, "{}", migration.name);
        }
        assert_eq!(latest_version() as usize, MIGRATIONS.len());
    }
}
