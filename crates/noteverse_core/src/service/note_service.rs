//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/get/list/update/delete APIs for an acting user.
//! - Apply access rules before returning or mutating any record.
//! - Drive the like and privacy toggles.
//!
//! # Invariants
//! - Checks run in the order: actor present, note exists, permission,
//!   input validation. A non-author never learns validation details.
//! - A failed check never mutates the store.
//! - Lists are newest-first by `created_at`.

use crate::access::{
    check_like, check_modify, check_read, require_actor, AccessDenied, Visibility,
};
use crate::model::draft::{NoteDraft, ValidationErrors};
use crate::model::ids::{NoteId, UserId};
use crate::model::note::{Branch, LikeState, Note, Year};
use crate::model::now_epoch_ms;
use crate::repo::note_repo::{NotePatch, NoteQuery, NoteRepository};
use crate::service::error::{ServiceError, ServiceResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Filter sentinel meaning "no filter" for `branch` and `year`.
pub const FILTER_ALL: &str = "all";

/// List request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListNotesRequest {
    /// Restrict to one author; drives the self-view/other-view split.
    pub author: Option<UserId>,
    /// Exact branch, or `all`.
    pub branch: Option<String>,
    /// Exact year, or `all`.
    pub year: Option<String>,
    pub subject: Option<String>,
    pub search: Option<String>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub note: Note,
    pub state: LikeState,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a note authored by `actor`.
    ///
    /// `is_public` defaults to `true`; likes start empty.
    pub fn create_note(&self, actor: Option<UserId>, draft: &NoteDraft) -> ServiceResult<Note> {
        let author = require_actor(actor).map_err(|_| ServiceError::Unauthorized)?;
        let valid = draft.validate().map_err(|errors| {
            warn!(
                "event=note_create module=service status=error error_code=validation violations={}",
                errors.violations().len()
            );
            errors
        })?;

        let now = now_epoch_ms();
        let note = Note {
            id: NoteId::new(),
            title: valid.title,
            content: valid.content,
            is_public: valid.is_public.unwrap_or(true),
            branch: valid.branch,
            year: valid.year,
            subject: valid.subject,
            files: valid.files.unwrap_or_default(),
            author_id: author,
            likes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };
        let note_id = self.repo.insert_note(&note)?;
        info!(
            "event=note_create module=service status=ok note_id={} author_id={} files={}",
            note_id,
            author,
            note.files.len()
        );
        self.load(note_id)
    }

    /// Gets one note if `actor` may read it.
    pub fn get_note(&self, actor: Option<UserId>, note_id: NoteId) -> ServiceResult<Note> {
        let note = self.load(note_id)?;
        check_read(&note, actor).map_err(|reason| deny("note_get", reason, note_id))?;
        Ok(note)
    }

    /// Lists notes visible to `actor` that match `request`.
    pub fn list_notes(
        &self,
        actor: Option<UserId>,
        request: &ListNotesRequest,
    ) -> ServiceResult<Vec<Note>> {
        let query = build_query(request)?;
        let visibility = Visibility::for_list(actor, request.author);
        let notes = self.repo.find_notes(&query, visibility)?;
        info!(
            "event=note_list module=service status=ok visibility={:?} count={}",
            visibility,
            notes.len()
        );
        Ok(notes)
    }

    /// Lists notes `actor` has liked and can still read.
    pub fn list_liked_notes(&self, actor: Option<UserId>) -> ServiceResult<Vec<Note>> {
        let user = require_actor(actor).map_err(|_| ServiceError::Unauthorized)?;
        let query = NoteQuery {
            liked_by: Some(user),
            ..NoteQuery::default()
        };
        Ok(self
            .repo
            .find_notes(&query, Visibility::PublicOrAuthoredBy(user))?)
    }

    /// Replaces a note's content fields. Author only.
    ///
    /// `is_public` and `files` change only when the draft supplies them.
    pub fn update_note(
        &self,
        actor: Option<UserId>,
        note_id: NoteId,
        draft: &NoteDraft,
    ) -> ServiceResult<Note> {
        require_actor(actor).map_err(|_| ServiceError::Unauthorized)?;
        let current = self.load(note_id)?;
        check_modify(&current, actor).map_err(|reason| deny("note_update", reason, note_id))?;
        let valid = draft.validate()?;

        let updated = self
            .repo
            .update_note_by_id(note_id, &NotePatch::from(valid))?
            .ok_or(ServiceError::NotFound(note_id))?;
        info!("event=note_update module=service status=ok note_id={note_id}");
        Ok(updated)
    }

    /// Deletes a note permanently. Author only.
    pub fn delete_note(&self, actor: Option<UserId>, note_id: NoteId) -> ServiceResult<()> {
        require_actor(actor).map_err(|_| ServiceError::Unauthorized)?;
        let current = self.load(note_id)?;
        check_modify(&current, actor).map_err(|reason| deny("note_delete", reason, note_id))?;

        if !self.repo.delete_note_by_id(note_id)? {
            return Err(ServiceError::NotFound(note_id));
        }
        info!("event=note_delete module=service status=ok note_id={note_id}");
        Ok(())
    }

    /// Flips `actor` in the note's like set.
    pub fn toggle_like(&self, actor: Option<UserId>, note_id: NoteId) -> ServiceResult<LikeToggle> {
        let user = require_actor(actor).map_err(|_| ServiceError::Unauthorized)?;
        let current = self.load(note_id)?;
        check_like(&current, actor).map_err(|reason| deny("note_like", reason, note_id))?;

        let state = self
            .repo
            .toggle_like(note_id, user)?
            .ok_or(ServiceError::NotFound(note_id))?;
        info!(
            "event=note_like module=service status=ok note_id={note_id} user_id={user} state={state:?}"
        );
        Ok(LikeToggle {
            note: self.load(note_id)?,
            state,
        })
    }

    /// Flips the note between public and private. Author only.
    pub fn toggle_privacy(&self, actor: Option<UserId>, note_id: NoteId) -> ServiceResult<Note> {
        require_actor(actor).map_err(|_| ServiceError::Unauthorized)?;
        let current = self.load(note_id)?;
        check_modify(&current, actor).map_err(|reason| deny("note_privacy", reason, note_id))?;

        let is_public = self
            .repo
            .toggle_public(note_id)?
            .ok_or(ServiceError::NotFound(note_id))?;
        info!("event=note_privacy module=service status=ok note_id={note_id} is_public={is_public}");
        self.load(note_id)
    }

    fn load(&self, note_id: NoteId) -> ServiceResult<Note> {
        self.repo
            .find_note_by_id(note_id)?
            .ok_or(ServiceError::NotFound(note_id))
    }
}

fn deny(event: &'static str, reason: AccessDenied, note_id: NoteId) -> ServiceError {
    warn!("event={event} module=service status=denied note_id={note_id} reason={reason}");
    ServiceError::denied(reason, note_id)
}

/// Normalizes a list request into a store query.
///
/// Blank values and the `all` sentinel disable a filter. Unknown branch or
/// year values are rejected rather than silently matching nothing.
pub fn build_query(request: &ListNotesRequest) -> Result<NoteQuery, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let branch = match enum_filter(request.branch.as_deref()) {
        Some(value) => {
            let parsed = Branch::parse(&value);
            if parsed.is_none() {
                errors.push("branch", "Invalid branch");
            }
            parsed
        }
        None => None,
    };
    let year = match enum_filter(request.year.as_deref()) {
        Some(value) => {
            let parsed = Year::parse(&value);
            if parsed.is_none() {
                errors.push("year", "Invalid year");
            }
            parsed
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NoteQuery {
        author: request.author,
        liked_by: None,
        branch,
        year,
        subject: text_filter(request.subject.as_deref()),
        search: text_filter(request.search.as_deref()),
    })
}

fn enum_filter(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(FILTER_ALL) {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

fn text_filter(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{build_query, ListNotesRequest};
    use crate::model::note::{Branch, Year};

    #[test]
    fn all_sentinel_and_blank_values_disable_filters() {
        let query = build_query(&ListNotesRequest {
            branch: Some("all".to_string()),
            year: Some("ALL".to_string()),
            subject: Some("   ".to_string()),
            search: None,
            author: None,
        })
        .unwrap();
        assert_eq!(query.branch, None);
        assert_eq!(query.year, None);
        assert_eq!(query.subject, None);
    }

    #[test]
    fn exact_filters_are_parsed() {
        let query = build_query(&ListNotesRequest {
            branch: Some("ECE".to_string()),
            year: Some("3".to_string()),
            search: Some(" fourier ".to_string()),
            ..ListNotesRequest::default()
        })
        .unwrap();
        assert_eq!(query.branch, Some(Branch::Ece));
        assert_eq!(query.year, Some(Year::Third));
        assert_eq!(query.search.as_deref(), Some("fourier"));
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        let errors = build_query(&ListNotesRequest {
            branch: Some("xx".to_string()),
            year: Some("9".to_string()),
            ..ListNotesRequest::default()
        })
        .unwrap_err();
        assert!(errors.has_field("branch"));
        assert!(errors.has_field("year"));
    }
}
