//! Unvalidated inputs and their validation.
//!
//! # Responsibility
//! - Accept loosely-typed create/update payloads.
//! - Report every violated field constraint in one pass.
//!
//! # Invariants
//! - A `ValidNote` always carries a known `Branch`/`Year` and non-blank
//!   title, content and subject.
//! - `title` and `subject` are trimmed; `content` is kept verbatim.

use crate::model::note::{Branch, FileRef, Year};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

const USERNAME_MIN_CHARS: usize = 3;

/// One violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Wire path of the field, e.g. `title` or `files[1].url`.
    pub field: String,
    pub message: String,
}

/// Non-empty list of violations produced by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a single-violation error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns whether `field` has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: ")?;
        for (idx, violation) in self.violations.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Attachment metadata as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRefDraft {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub size: Option<u64>,
}

/// Note create/update payload before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub subject: Option<String>,
    pub files: Option<Vec<FileRefDraft>>,
}

/// Validated note fields ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNote {
    pub title: String,
    pub content: String,
    /// `None` keeps the current value (or the `true` default on create).
    pub is_public: Option<bool>,
    pub branch: Branch,
    pub year: Year,
    pub subject: String,
    /// `None` keeps the current attachments (or none on create).
    pub files: Option<Vec<FileRef>>,
}

impl NoteDraft {
    /// Convenience constructor with all required fields set.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        branch: impl Into<String>,
        year: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            is_public: None,
            branch: Some(branch.into()),
            year: Some(year.into()),
            subject: Some(subject.into()),
            files: None,
        }
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    pub fn with_files(mut self, files: Vec<FileRefDraft>) -> Self {
        self.files = Some(files);
        self
    }

    /// Validates every field and collects all violations.
    pub fn validate(&self) -> Result<ValidNote, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(&mut errors, "title", self.title.as_deref(), "Title is required");
        let content = match self.content.as_deref() {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => {
                errors.push("content", "Content is required");
                String::new()
            }
        };
        let branch = self.branch.as_deref().map(str::trim).and_then(Branch::parse);
        if branch.is_none() {
            errors.push("branch", "Invalid branch");
        }
        let year = self.year.as_deref().map(str::trim).and_then(Year::parse);
        if year.is_none() {
            errors.push("year", "Invalid year");
        }
        let subject = required_text(
            &mut errors,
            "subject",
            self.subject.as_deref(),
            "Subject is required",
        );
        let files = self
            .files
            .as_ref()
            .map(|files| validate_files(&mut errors, files));

        match (branch, year) {
            (Some(branch), Some(year)) => errors.into_result(|| ValidNote {
                title,
                content,
                is_public: self.is_public,
                branch,
                year,
                subject,
                files,
            }),
            _ => Err(errors),
        }
    }
}

/// Validates registration input and returns the normalized pair.
///
/// - `username`: trimmed, at least 3 characters.
/// - `email`: trimmed, lowercased, `local@domain.tld` shape.
pub fn validate_registration(
    username: &str,
    email: &str,
) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let username = username.trim().to_string();
    if username.chars().count() < USERNAME_MIN_CHARS {
        errors.push(
            "username",
            format!("Username must be at least {USERNAME_MIN_CHARS} characters"),
        );
    }
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        errors.push("email", "Invalid email");
    }
    errors.into_result(|| (username, email))
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    message: &str,
) -> String {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => {
            errors.push(field, message);
            String::new()
        }
    }
}

fn validate_files(errors: &mut ValidationErrors, files: &[FileRefDraft]) -> Vec<FileRef> {
    let mut valid = Vec::with_capacity(files.len());
    for (idx, draft) in files.iter().enumerate() {
        let before = errors.violations().len();
        let name = required_text(
            errors,
            &format!("files[{idx}].name"),
            draft.name.as_deref(),
            "File name is required",
        );
        let url = required_text(
            errors,
            &format!("files[{idx}].url"),
            draft.url.as_deref(),
            "File url is required",
        );
        let file_type = required_text(
            errors,
            &format!("files[{idx}].type"),
            draft.file_type.as_deref(),
            "File type is required",
        );
        if draft.size.is_none() {
            errors.push(format!("files[{idx}].size"), "File size is required");
        }
        if errors.violations().len() == before {
            valid.push(FileRef {
                name,
                url,
                file_type,
                size: draft.size.unwrap_or_default(),
            });
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::{validate_registration, FileRefDraft, NoteDraft};
    use crate::model::note::{Branch, Year};

    #[test]
    fn validate_trims_title_and_subject_but_keeps_content() {
        let draft = NoteDraft::new("  Title  ", "  body\n", "cs", "2", " DSA ");
        let valid = draft.validate().expect("draft should validate");
        assert_eq!(valid.title, "Title");
        assert_eq!(valid.subject, "DSA");
        assert_eq!(valid.content, "  body\n");
        assert_eq!(valid.branch, Branch::Cs);
        assert_eq!(valid.year, Year::Second);
        assert_eq!(valid.is_public, None);
        assert_eq!(valid.files, None);
    }

    #[test]
    fn validate_reports_every_violation() {
        let draft = NoteDraft {
            title: Some("   ".to_string()),
            content: None,
            branch: Some("xx".to_string()),
            year: Some("7".to_string()),
            subject: None,
            ..NoteDraft::default()
        };
        let errors = draft.validate().expect_err("draft must fail");
        for field in ["title", "content", "branch", "year", "subject"] {
            assert!(errors.has_field(field), "missing violation for {field}");
        }
        assert_eq!(errors.violations().len(), 5);
    }

    #[test]
    fn validate_checks_each_file_entry() {
        let draft = NoteDraft::new("t", "c", "me", "1", "s").with_files(vec![
            FileRefDraft {
                name: Some("a.pdf".to_string()),
                url: Some("/uploads/a.pdf".to_string()),
                file_type: Some("application/pdf".to_string()),
                size: Some(12),
            },
            FileRefDraft {
                name: Some("b.pdf".to_string()),
                url: Some(String::new()),
                file_type: None,
                size: None,
            },
        ]);
        let errors = draft.validate().expect_err("second file is incomplete");
        assert!(errors.has_field("files[1].url"));
        assert!(errors.has_field("files[1].type"));
        assert!(errors.has_field("files[1].size"));
        assert!(!errors.has_field("files[0].url"));
    }

    #[test]
    fn draft_deserializes_wire_shape() {
        let value = serde_json::json!({
            "title": "Signals",
            "content": "fourier",
            "is_public": false,
            "branch": "ece",
            "year": "3",
            "subject": "DSP",
            "files": [{"name": "n.pdf", "url": "/u/n.pdf", "type": "application/pdf", "size": 3}]
        });
        let draft: NoteDraft = serde_json::from_value(value).unwrap();
        let valid = draft.validate().unwrap();
        assert_eq!(valid.is_public, Some(false));
        assert_eq!(valid.files.unwrap()[0].file_type, "application/pdf");
    }

    #[test]
    fn registration_normalizes_and_rejects() {
        let (username, email) = validate_registration(" alice ", " Alice@Example.COM ").unwrap();
        assert_eq!(username, "alice");
        assert_eq!(email, "alice@example.com");

        let errors = validate_registration("al", "nope").expect_err("both invalid");
        assert!(errors.has_field("username"));
        assert!(errors.has_field("email"));
    }

    #[test]
    fn display_joins_violations() {
        let errors = NoteDraft::default().validate().unwrap_err();
        let text = errors.to_string();
        assert!(text.starts_with("validation failed: title: Title is required"));
        assert!(text.contains("; branch: Invalid branch"));
    }
}
