//! Core domain logic for NoteVerse.
//! Access rules, validation and persistence for shared study notes live here;
//! boundary crates only translate input and output.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{AccessDenied, Visibility};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::draft::{FieldViolation, FileRefDraft, NoteDraft, ValidationErrors};
pub use model::ids::{NoteId, UserId};
pub use model::note::{Branch, FileRef, LikeState, Note, Year};
pub use model::user::User;
pub use repo::note_repo::{NotePatch, NoteQuery, NoteRepository, SqliteNoteRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::error::{ServiceError, ServiceResult};
pub use service::note_service::{LikeToggle, ListNotesRequest, NoteService};
pub use service::user_service::{PopulatedNote, UserService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
