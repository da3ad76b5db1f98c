//! User domain model.
//!
//! # Invariants
//! - `id` is strictly positive once persisted and never reused.
//! - `created_at`/`updated_at` are assigned by the store, never by callers.

use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
///
/// Zero or negative values never name a persisted row.
pub type UserId = i64;

/// A registered account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name, trimmed and non-empty.
    pub name: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Returns whether `id` can name a persisted row.
pub fn is_valid_id(id: i64) -> bool {
    id > 0
}
