//! Read-only query shapes for user and email lookups.

use super::email::EmailId;
use super::user::UserId;
use serde::{Deserialize, Serialize};

/// Row bound applied when a filter does not carry its own limit.
pub const FILTER_DEFAULT_LIMIT: u32 = 100;

/// Query shape for user id lookups.
///
/// An `email` filter takes precedence; otherwise a bounded scan is issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersFilter {
    /// Exact address owned by the wanted users.
    pub email: Option<String>,
    /// Maximum rows for the bounded scan. `None` and `Some(0)` use the default.
    pub limit: Option<u32>,
}

impl UsersFilter {
    pub fn by_email(address: impl Into<String>) -> Self {
        Self {
            email: Some(address.into()),
            limit: None,
        }
    }

    pub fn with_limit(limit: u32) -> Self {
        Self {
            email: None,
            limit: Some(limit),
        }
    }

    /// Effective row bound for this filter.
    pub fn applied_limit(&self) -> u32 {
        normalize_limit(self.limit)
    }
}

/// Query shape for email lookups. Every criterion that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailsFilter {
    pub user_id: Option<UserId>,
    pub email_id: Option<EmailId>,
    pub address: Option<String>,
    /// Maximum rows returned. `None` and `Some(0)` use the default.
    pub limit: Option<u32>,
}

impl EmailsFilter {
    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn by_id(email_id: EmailId) -> Self {
        Self {
            email_id: Some(email_id),
            ..Self::default()
        }
    }

    pub fn by_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    /// Effective row bound for this filter.
    pub fn applied_limit(&self) -> u32 {
        normalize_limit(self.limit)
    }
}

fn normalize_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => FILTER_DEFAULT_LIMIT,
        Some(value) => value,
    }
}
