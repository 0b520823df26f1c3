//! Service-level error taxonomy.
//!
//! Every variant is terminal for the caller; none is retried inside core.

use crate::access::AccessDenied;
use crate::model::draft::ValidationErrors;
use crate::model::ids::{NoteId, UserId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by note and user use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing input; one entry per violated field.
    Validation(ValidationErrors),
    /// No actor present where one is required.
    Unauthorized,
    /// Actor present but not allowed to act on the note.
    Forbidden(NoteId),
    NotFound(NoteId),
    UserNotFound(UserId),
    /// Store fault, surfaced as "service unavailable".
    Repo(RepoError),
}

impl ServiceError {
    /// Transport status a boundary layer should report.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) | Self::UserNotFound(_) => 404,
            Self::Repo(_) => 503,
        }
    }

    /// Stable machine-readable code for logs and payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "note_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::Repo(_) => "service_unavailable",
        }
    }

    pub(crate) fn denied(reason: AccessDenied, note_id: NoteId) -> Self {
        match reason {
            AccessDenied::Unauthorized => Self::Unauthorized,
            AccessDenied::Forbidden => Self::Forbidden(note_id),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::Unauthorized => write!(f, "not authorized: sign-in required"),
            Self::Forbidden(note_id) => write!(f, "not allowed to access note {note_id}"),
            Self::NotFound(note_id) => write!(f, "note not found: {note_id}"),
            Self::UserNotFound(user_id) => write!(f, "user not found: {user_id}"),
            Self::Repo(err) => write!(f, "service unavailable: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::model::draft::ValidationErrors;
    use crate::model::ids::NoteId;

    #[test]
    fn status_codes_follow_taxonomy() {
        let id = NoteId::new();
        assert_eq!(
            ServiceError::Validation(ValidationErrors::single("title", "Title is required"))
                .status_code(),
            400
        );
        assert_eq!(ServiceError::Unauthorized.status_code(), 401);
        assert_eq!(ServiceError::Forbidden(id).status_code(), 403);
        assert_eq!(ServiceError::NotFound(id).status_code(), 404);
    }
}
