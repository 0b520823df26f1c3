//! Canonical identifier types.
//!
//! # Responsibility
//! - Give notes and users one opaque identity type each.
//! - Keep storage-native id encodings behind the repository boundary.
//!
//! # Invariants
//! - Ids are never nil, whether parsed from text or deserialized.
//! - Text form is the lowercase hyphenated UUID.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when an id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    kind: &'static str,
    value: String,
}

impl Display for IdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} id `{}`", self.kind, self.value)
    }
}

impl Error for IdParseError {}

fn parse_id(kind: &'static str, value: &str) -> Result<Uuid, IdParseError> {
    match Uuid::parse_str(value.trim()) {
        Ok(uuid) if !uuid.is_nil() => Ok(uuid),
        _ => Err(IdParseError {
            kind,
            value: value.to_string(),
        }),
    }
}

/// Stable identifier of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct NoteId(Uuid);

impl NoteId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID. Returns `None` for the nil UUID.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        (!uuid.is_nil()).then_some(Self(uuid))
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NoteId {
    type Err = IdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_id("note", value).map(Self)
    }
}

impl TryFrom<String> for NoteId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stable identifier of a user (actor, author or liker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID. Returns `None` for the nil UUID.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        (!uuid.is_nil()).then_some(Self(uuid))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_id("user", value).map(Self)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteId, UserId};
    use uuid::Uuid;

    #[test]
    fn display_and_parse_agree() {
        let id = NoteId::new();
        let parsed: NoteId = id.to_string().parse().expect("own text form must parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_nil_and_garbage() {
        assert!("00000000-0000-0000-0000-000000000000"
            .parse::<UserId>()
            .is_err());
        let err = "not-an-id".parse::<UserId>().expect_err("garbage must fail");
        assert_eq!(err.to_string(), "invalid user id `not-an-id`");
    }

    #[test]
    fn deserialize_rejects_nil_and_serializes_as_plain_string() {
        let nil = "\"00000000-0000-0000-0000-000000000000\"";
        assert!(serde_json::from_str::<NoteId>(nil).is_err());
        assert!(serde_json::from_str::<UserId>(nil).is_err());

        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<UserId>(&json).unwrap(), id);
    }

    #[test]
    fn from_uuid_rejects_nil() {
        assert!(NoteId::from_uuid(Uuid::nil()).is_none());
        assert!(UserId::from_uuid(Uuid::new_v4()).is_some());
    }
}
