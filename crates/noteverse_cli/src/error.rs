//! CLI error type and exit-code mapping.

use noteverse_core::db::DbError;
use noteverse_core::{RepoError, ServiceError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Service(ServiceError),
    Db(DbError),
    Repo(RepoError),
    /// `--as` named a username with no registered identity.
    UnknownActor(String),
    /// A username argument matched no registered identity.
    UnknownUser(String),
    Logging(String),
    Output(serde_json::Error),
}

impl CliError {
    /// Process exit code: 2 validation, 3 unauthorized, 4 forbidden,
    /// 5 not found, 1 anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Service(err) => match err.status_code() {
                400 => 2,
                401 => 3,
                403 => 4,
                404 => 5,
                _ => 1,
            },
            Self::UnknownActor(_) => 3,
            Self::UnknownUser(_) => 5,
            Self::Db(_) | Self::Repo(_) | Self::Logging(_) | Self::Output(_) => 1,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{} ({})", err, err.code()),
            Self::Db(err) => write!(f, "database unavailable: {err}"),
            Self::Repo(err) => write!(f, "store unavailable: {err}"),
            Self::UnknownActor(username) => {
                write!(f, "not authorized: unknown user `{username}` for --as")
            }
            Self::UnknownUser(username) => write!(f, "user not found: `{username}`"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Output(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::UnknownActor(_) | Self::UnknownUser(_) | Self::Logging(_) => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use noteverse_core::{NoteId, ServiceError, ValidationErrors};

    #[test]
    fn exit_codes_follow_service_status() {
        let id = NoteId::new();
        let cases = [
            (
                CliError::from(ServiceError::from(ValidationErrors::single(
                    "title",
                    "Title is required",
                ))),
                2,
            ),
            (CliError::from(ServiceError::Unauthorized), 3),
            (CliError::from(ServiceError::Forbidden(id)), 4),
            (CliError::from(ServiceError::NotFound(id)), 5),
            (CliError::UnknownActor("ghost".to_string()), 3),
            (CliError::Logging("bad level".to_string()), 1),
        ];
        for (err, expected) in cases {
            assert_eq!(err.exit_code(), expected, "{err}");
        }
    }
}
