//! Note visibility and ownership rules.
//!
//! # Responsibility
//! - Decide whether an actor may read, modify or like a note.
//! - Derive the visibility predicate applied to bulk list queries.
//!
//! # Invariants
//! - Decisions are pure; they never touch storage.
//! - Anonymous actors are `Unauthorized` for any mutation, never `Forbidden`.
//! - A private note is readable by its author only.
//! - An author listing their own notes sees private ones too; anyone else
//!   listing that author sees public ones only.

use crate::model::ids::UserId;
use crate::model::note::Note;
use std::fmt::{Display, Formatter};

/// Reason an access check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No actor was present where one is required.
    Unauthorized,
    /// An actor is present but lacks permission for the note.
    Forbidden,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
        }
    }
}

pub type AccessResult = Result<(), AccessDenied>;

/// Read permission: public notes for everyone, private ones for the author.
pub fn check_read(note: &Note, actor: Option<UserId>) -> AccessResult {
    if note.is_public || note.is_authored_by(actor) {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Write/delete/privacy-toggle permission: author only.
pub fn check_modify(note: &Note, actor: Option<UserId>) -> AccessResult {
    let actor = require_actor(actor)?;
    if note.author_id == actor {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Like-toggle permission: any authenticated actor that can read the note.
pub fn check_like(note: &Note, actor: Option<UserId>) -> AccessResult {
    let actor = require_actor(actor)?;
    check_read(note, Some(actor))
}

/// Fails with `Unauthorized` when no actor is present.
pub fn require_actor(actor: Option<UserId>) -> Result<UserId, AccessDenied> {
    actor.ok_or(AccessDenied::Unauthorized)
}

/// Visibility predicate for bulk reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only `is_public` notes.
    PublicOnly,
    /// Public notes plus every note authored by the given user.
    PublicOrAuthoredBy(UserId),
    /// No visibility restriction.
    Unrestricted,
}

impl Visibility {
    /// Resolves the predicate for `actor` listing with an optional author filter.
    ///
    /// - no filter, anonymous: public only
    /// - no filter, actor `A`: public or authored by `A`
    /// - filter `X == actor`: unrestricted (self view)
    /// - filter `X != actor`: public only
    pub fn for_list(actor: Option<UserId>, author_filter: Option<UserId>) -> Self {
        match (actor, author_filter) {
            (None, _) => Self::PublicOnly,
            (Some(actor), None) => Self::PublicOrAuthoredBy(actor),
            (Some(actor), Some(author)) if actor == author => Self::Unrestricted,
            (Some(_), Some(_)) => Self::PublicOnly,
        }
    }

    /// Evaluates the predicate against one note.
    pub fn admits(&self, note: &Note) -> bool {
        match self {
            Self::PublicOnly => note.is_public,
            Self::PublicOrAuthoredBy(user) => note.is_public || note.author_id == *user,
            Self::Unrestricted => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{check_like, check_modify, check_read, AccessDenied, Visibility};
    use crate::model::ids::{NoteId, UserId};
    use crate::model::note::{Branch, Note, Year};
    use std::collections::BTreeSet;

    fn note(author: UserId, is_public: bool) -> Note {
        Note {
            id: NoteId::new(),
            title: "Graphs".to_string(),
            content: "bfs dfs".to_string(),
            is_public,
            branch: Branch::Cs,
            year: Year::Second,
            subject: "DSA".to_string(),
            files: Vec::new(),
            author_id: author,
            likes: BTreeSet::new(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn read_public_is_open_to_everyone() {
        let author = UserId::new();
        let public = note(author, true);
        assert_eq!(check_read(&public, None), Ok(()));
        assert_eq!(check_read(&public, Some(UserId::new())), Ok(()));
        assert_eq!(check_read(&public, Some(author)), Ok(()));
    }

    #[test]
    fn read_private_is_author_only() {
        let author = UserId::new();
        let private = note(author, false);
        assert_eq!(check_read(&private, None), Err(AccessDenied::Forbidden));
        assert_eq!(
            check_read(&private, Some(UserId::new())),
            Err(AccessDenied::Forbidden)
        );
        assert_eq!(check_read(&private, Some(author)), Ok(()));
    }

    #[test]
    fn modify_distinguishes_anonymous_from_other_user() {
        let author = UserId::new();
        let public = note(author, true);
        assert_eq!(check_modify(&public, None), Err(AccessDenied::Unauthorized));
        assert_eq!(
            check_modify(&public, Some(UserId::new())),
            Err(AccessDenied::Forbidden)
        );
        assert_eq!(check_modify(&public, Some(author)), Ok(()));
    }

    #[test]
    fn like_requires_actor_and_read_access() {
        let author = UserId::new();
        let other = UserId::new();
        assert_eq!(
            check_like(&note(author, true), None),
            Err(AccessDenied::Unauthorized)
        );
        assert_eq!(check_like(&note(author, true), Some(other)), Ok(()));
        assert_eq!(
            check_like(&note(author, false), Some(other)),
            Err(AccessDenied::Forbidden)
        );
        assert_eq!(check_like(&note(author, false), Some(author)), Ok(()));
    }

    #[test]
    fn list_visibility_covers_all_scopes() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(Visibility::for_list(None, None), Visibility::PublicOnly);
        assert_eq!(Visibility::for_list(None, Some(a)), Visibility::PublicOnly);
        assert_eq!(
            Visibility::for_list(Some(a), None),
            Visibility::PublicOrAuthoredBy(a)
        );
        assert_eq!(Visibility::for_list(Some(a), Some(a)), Visibility::Unrestricted);
        assert_eq!(Visibility::for_list(Some(b), Some(a)), Visibility::PublicOnly);
    }

    #[test]
    fn other_view_never_admits_private_notes() {
        let a = UserId::new();
        let b = UserId::new();
        let private = note(a, false);
        let visibility = Visibility::for_list(Some(b), Some(a));
        assert!(!visibility.admits(&private));
        assert!(visibility.admits(&note(a, true)));
        assert!(Visibility::for_list(Some(a), Some(a)).admits(&private));
        assert!(Visibility::for_list(Some(a), None).admits(&private));
        assert!(!Visibility::for_list(Some(b), None).admits(&private));
    }
}
