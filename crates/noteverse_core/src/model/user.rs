//! User identity model.
//!
//! Credentials are handled outside core; a user here is only the public
//! identity that notes reference as author or liker.

use crate::model::ids::UserId;
use serde::{Deserialize, Serialize};

/// Registered user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
