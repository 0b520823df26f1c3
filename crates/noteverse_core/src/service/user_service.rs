//! User use-case service.
//!
//! # Responsibility
//! - Register and look up user identities.
//! - Expand note author/liker ids into public identities for display.
//!
//! # Invariants
//! - Email is stored lowercased; username keeps its casing but is unique
//!   case-insensitively.

use crate::model::draft::{validate_registration, ValidationErrors};
use crate::model::ids::UserId;
use crate::model::note::Note;
use crate::model::now_epoch_ms;
use crate::model::user::User;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::error::{ServiceError, ServiceResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Note with author and likers resolved to user identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulatedNote {
    pub note: Note,
    /// `None` when the author id has no registered identity.
    pub author: Option<User>,
    /// Likers with a registered identity, ordered by id.
    pub liked_by: Vec<User>,
}

/// User service facade over repository implementations.
pub struct UserService<U: UserRepository> {
    repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    /// Registers a new identity.
    ///
    /// Duplicate email or username is reported as a validation error on
    /// the offending field.
    pub fn register_user(&self, username: &str, email: &str) -> ServiceResult<User> {
        let (username, email) = validate_registration(username, email)?;

        let mut errors = ValidationErrors::new();
        if self.repo.find_user_by_email(&email)?.is_some() {
            errors.push("email", "User already exists");
        }
        if self.repo.find_user_by_username(&username)?.is_some() {
            errors.push("username", "Username already taken");
        }
        if !errors.is_empty() {
            warn!("event=user_register module=service status=error error_code=duplicate");
            return Err(errors.into());
        }

        let user = User {
            id: UserId::new(),
            username,
            email,
            created_at: now_epoch_ms(),
        };
        match self.repo.insert_user(&user) {
            Ok(user_id) => {
                info!("event=user_register module=service status=ok user_id={user_id}");
                Ok(user)
            }
            // Lost a race with a concurrent registration.
            Err(RepoError::Conflict(_)) => Err(ValidationErrors::single(
                "email",
                "User already exists",
            )
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_user(&self, user_id: UserId) -> ServiceResult<User> {
        self.repo
            .find_user_by_id(user_id)?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    pub fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_user_by_username(username)?)
    }

    /// Resolves `note.author_id` and `note.likes` into identities.
    ///
    /// Ids without a registered user are skipped.
    pub fn populate(&self, note: Note) -> ServiceResult<PopulatedNote> {
        let author = self.repo.find_user_by_id(note.author_id)?;
        let mut liked_by = Vec::with_capacity(note.likes.len());
        for user_id in &note.likes {
            if let Some(user) = self.repo.find_user_by_id(*user_id)? {
                liked_by.push(user);
            }
        }
        Ok(PopulatedNote {
            note,
            author,
            liked_by,
        })
    }
}
