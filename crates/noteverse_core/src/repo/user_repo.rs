//! User store contracts and SQLite implementation.
//!
//! # Invariants
//! - `username` and `email` are unique, compared case-insensitively.

use crate::model::ids::UserId;
use crate::model::user::User;
use crate::repo::{ensure_table_ready, parse_user_id, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};

const USER_SELECT_SQL: &str = "SELECT uuid, username, email, created_at FROM users";

/// Store interface for user identities.
pub trait UserRepository {
    /// Inserts a user. Returns `RepoError::Conflict` on a duplicate
    /// username or email.
    fn insert_user(&self, user: &User) -> RepoResult<UserId>;
    fn find_user_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "users", &["uuid", "username", "email", "created_at"])?;
        Ok(Self { conn })
    }

    fn find_one(&self, column: &str, value: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {column} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        parse_user_row(row).map(Some)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, user: &User) -> RepoResult<UserId> {
        let result = self.conn.execute(
            "INSERT INTO users (uuid, username, email, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                user.created_at,
            ],
        );
        match result {
            Ok(_) => Ok(user.id),
            Err(rusqlite::Error::SqliteFailure(err, message))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Conflict(
                    message.unwrap_or_else(|| "user already exists".to_string()),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_user_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.find_one("uuid", &id.to_string())
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_one("username", username.trim())
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("email", email.trim())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        id: parse_user_id(&uuid_text)?,
        username: row.get("username")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}
