//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its classification enums.
//! - Provide the like-set helpers used by toggle semantics.
//!
//! # Invariants
//! - `author_id` never changes after creation.
//! - `likes` is a set; one user appears at most once.
//! - `updated_at >= created_at`.

use crate::model::ids::{NoteId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Engineering branch a note belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Cs,
    It,
    Ee,
    Ece,
    Ete,
    Me,
    Prod,
    Textile,
    Ce,
    Chem,
}

impl Branch {
    pub const ALL: [Branch; 10] = [
        Self::Cs,
        Self::It,
        Self::Ee,
        Self::Ece,
        Self::Ete,
        Self::Me,
        Self::Prod,
        Self::Textile,
        Self::Ce,
        Self::Chem,
    ];

    /// Stable wire/storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cs => "cs",
            Self::It => "it",
            Self::Ee => "ee",
            Self::Ece => "ece",
            Self::Ete => "ete",
            Self::Me => "me",
            Self::Prod => "prod",
            Self::Textile => "textile",
            Self::Ce => "ce",
            Self::Chem => "chem",
        }
    }

    /// Parses the exact lowercase wire string.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|branch| branch.as_str() == value)
    }
}

/// Study year, `1` through `4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Year {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "4")]
    Fourth,
}

impl Year {
    pub const ALL: [Year; 4] = [Self::First, Self::Second, Self::Third, Self::Fourth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
            Self::Third => "3",
            Self::Fourth => "4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|year| year.as_str() == value)
    }
}

/// Metadata of one stored attachment. File bytes live outside core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Original file name as uploaded.
    pub name: String,
    /// Location where the attachment can be fetched.
    pub url: String,
    /// MIME type, serialized as `type`.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// Per-user like state for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeState {
    Liked,
    NotLiked,
}

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub branch: Branch,
    pub year: Year,
    pub subject: String,
    pub files: Vec<FileRef>,
    pub author_id: UserId,
    pub likes: BTreeSet<UserId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Refreshed by every mutation.
    pub updated_at: i64,
}

impl Note {
    /// Returns whether `actor` is this note's author.
    pub fn is_authored_by(&self, actor: Option<UserId>) -> bool {
        actor == Some(self.author_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}
