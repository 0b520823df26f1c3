//! Domain model for notes and their authors.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Validate caller input before it reaches persistence.
//!
//! # Invariants
//! - Every note and user is identified by an opaque, non-nil id newtype.
//! - Deletion is immediate; there are no tombstones.

pub mod draft;
pub mod ids;
pub mod note;
pub mod user;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
