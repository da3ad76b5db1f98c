//! Email domain model.
//!
//! # Invariants
//! - `user_id` names the owning user at insert time; the email does not own
//!   that user.
//! - `address` is unique across all users.

use super::user::UserId;
use serde::{Deserialize, Serialize};

/// Store-assigned email identifier.
pub type EmailId = i64;

/// Mail address attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: EmailId,
    pub user_id: UserId,
    pub address: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}
