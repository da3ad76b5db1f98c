//! Account use-case service.
//!
//! # Responsibility
//! - Validate transport-level input (names, mail addresses, ids).
//! - Own transaction lifecycle: begin, commit on success, roll back on error.
//! - Map repository outcomes to caller-facing error kinds.
//!
//! # Invariants
//! - Every write runs in exactly one transaction opened here.
//! - Repository errors are passed through unchanged; only the public message
//!   hides infrastructure detail.
//! - Deleting a user does not delete its emails here; the schema decides.

use crate::context::Context;
use crate::model::email::{Email, EmailId};
use crate::model::filter::{EmailsFilter, UsersFilter};
use crate::model::user::{is_valid_id, User, UserId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::storage::Storage;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Transaction;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s<>(),;:\x22\[\]]+@[^@\s<>(),;:\x22\[\]]+\.[^@\s<>(),;:\x22\[\].]+$")
        .expect("valid email address regex")
});

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    Cancelled,
    /// Infrastructure failure; details are for operators only.
    Internal,
}

/// Service error for account use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before reaching storage.
    InvalidInput(String),
    /// Lookup by id matched no user.
    UserNotFound(UserId),
    /// Lookup by id matched no email.
    EmailNotFound(EmailId),
    /// Persistence-layer failure, kind preserved.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UserNotFound(_) | Self::EmailNotFound(_) => ErrorKind::NotFound,
            Self::Repo(RepoError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Repo(RepoError::AlreadyExists { .. }) => ErrorKind::AlreadyExists,
            Self::Repo(RepoError::Cancelled { .. }) => ErrorKind::Cancelled,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show end users.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::UserNotFound(_) => "user not found".to_string(),
            Self::EmailNotFound(_) => "email not found".to_string(),
            Self::Repo(_) => match self.kind() {
                ErrorKind::NotFound => "not found".to_string(),
                ErrorKind::AlreadyExists => "already exists".to_string(),
                ErrorKind::Cancelled => "request cancelled".to_string(),
                ErrorKind::InvalidInput | ErrorKind::Internal => "service failed".to_string(),
            },
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UserNotFound(user_id) => write!(f, "user not found: {user_id}"),
            Self::EmailNotFound(email_id) => write!(f, "email not found: {email_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Account service facade over a storage implementation.
pub struct AccountService<S: Storage> {
    storage: S,
}

impl<S: Storage> AccountService<S> {
    /// Creates a service using the provided storage implementation.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Registers a user and returns its id.
    pub fn add_user(&self, ctx: &Context, name: &str) -> ServiceResult<UserId> {
        let name = normalize_name(name)
            .ok_or_else(|| ServiceError::InvalidInput("empty name".to_string()))?;

        let user_id = self.in_transaction("add_user", |tx| {
            self.storage.add_user(ctx, tx, name.as_str())
        })?;
        info!("event=user_add module=service status=ok user_id={user_id}");
        Ok(user_id)
    }

    /// Gets one user by id.
    pub fn get_user(&self, ctx: &Context, user_id: UserId) -> ServiceResult<User> {
        ensure_valid_id(user_id, "invalid user ID")?;
        let users = self.read("get_user", self.storage.fetch_users(ctx, &[user_id]))?;
        users
            .into_iter()
            .next()
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    /// Gets the user owning `address`.
    pub fn get_user_by_email(&self, ctx: &Context, address: &str) -> ServiceResult<User> {
        let address = normalize_email_address(address)?;
        let ids = self.read(
            "get_user_by_email",
            self.storage
                .filter_users_id(ctx, &UsersFilter::by_email(address.as_str())),
        )?;
        let users = self.read("get_user_by_email", self.storage.fetch_users(ctx, &ids))?;
        users.into_iter().next().ok_or_else(|| {
            ServiceError::Repo(RepoError::NotFound {
                op: "get_user_by_email",
            })
        })
    }

    /// Lists users matching `filter`, resolving ids to full entities.
    pub fn filter_users(&self, ctx: &Context, filter: &UsersFilter) -> ServiceResult<Vec<User>> {
        let ids = self.read("filter_users", self.storage.filter_users_id(ctx, filter))?;
        self.read("filter_users", self.storage.fetch_users(ctx, &ids))
    }

    /// Deletes one user.
    pub fn delete_user(&self, ctx: &Context, user_id: UserId) -> ServiceResult<()> {
        ensure_valid_id(user_id, "invalid user ID")?;
        self.in_transaction("delete_user", |tx| {
            self.storage.delete_user(ctx, tx, user_id)
        })?;
        info!("event=user_delete module=service status=ok user_id={user_id}");
        Ok(())
    }

    /// Attaches a validated address to an existing user.
    pub fn add_email(
        &self,
        ctx: &Context,
        user_id: UserId,
        address: &str,
    ) -> ServiceResult<EmailId> {
        let address = normalize_email_address(address)?;
        ensure_valid_id(user_id, "invalid user ID")?;

        let email_id = self.in_transaction("add_email", |tx| {
            self.storage.add_email(ctx, tx, user_id, address.as_str())
        })?;
        info!(
            "event=email_add module=service status=ok user_id={user_id} email_id={email_id}"
        );
        Ok(email_id)
    }

    /// Gets one email by id.
    pub fn get_email(&self, ctx: &Context, email_id: EmailId) -> ServiceResult<Email> {
        ensure_valid_id(email_id, "invalid email ID")?;
        let emails = self.read("get_email", self.storage.fetch_emails(ctx, &[email_id]))?;
        emails
            .into_iter()
            .next()
            .ok_or(ServiceError::EmailNotFound(email_id))
    }

    /// Lists emails matching `filter`.
    pub fn filter_emails(
        &self,
        ctx: &Context,
        filter: &EmailsFilter,
    ) -> ServiceResult<Vec<Email>> {
        self.read("filter_emails", self.storage.filter_emails(ctx, filter))
    }

    /// Deletes one email.
    pub fn delete_email(&self, ctx: &Context, email_id: EmailId) -> ServiceResult<()> {
        ensure_valid_id(email_id, "invalid email ID")?;
        self.in_transaction("delete_email", |tx| {
            self.storage.delete_email(ctx, tx, email_id)
        })?;
        info!("event=email_delete module=service status=ok email_id={email_id}");
        Ok(())
    }

    fn in_transaction<T>(
        &self,
        op: &'static str,
        work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> ServiceResult<T> {
        let tx = self.storage.begin().map_err(|err| log_failure(op, err.into()))?;

        match work(&tx) {
            Ok(value) => {
                tx.commit().map_err(|source| {
                    log_failure(op, RepoError::Execution { op: "commit", source }.into())
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=tx_rollback module=service status=error op={op} error={rollback_err}"
                    );
                }
                Err(log_failure(op, err.into()))
            }
        }
    }

    fn read<T>(&self, op: &'static str, result: RepoResult<T>) -> ServiceResult<T> {
        result.map_err(|err| log_failure(op, err.into()))
    }
}

/// Trims `name`; returns `None` when nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Returns whether `address` is a bare `local@domain.tld` mail address.
pub fn is_valid_email_address(address: &str) -> bool {
    EMAIL_ADDRESS_RE.is_match(address)
}

fn normalize_email_address(address: &str) -> ServiceResult<String> {
    let trimmed = address.trim();
    if !is_valid_email_address(trimmed) {
        return Err(ServiceError::InvalidInput(
            "invalid email address".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn ensure_valid_id(id: i64, message: &str) -> ServiceResult<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(message.to_string()))
    }
}

fn log_failure(op: &'static str, err: ServiceError) -> ServiceError {
    match err.kind() {
        ErrorKind::Internal => {
            error!("event=service_call module=service status=error op={op} error={err}")
        }
        kind => warn!(
            "event=service_call module=service status=rejected op={op} kind={kind:?} error={err}"
        ),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email_address, normalize_name, ErrorKind, ServiceError};
    use crate::repo::error::RepoError;

    #[test]
    fn normalize_name_trims_and_rejects_blank() {
        assert_eq!(normalize_name("  ada "), Some("ada".to_string()));
        assert_eq!(normalize_name(" \t "), None);
    }

    #[test]
    fn email_address_validation_accepts_plain_addresses_only() {
        assert!(is_valid_email_address("ada@example.com"));
        assert!(is_valid_email_address("first.last+tag@mail.example.org"));
        assert!(!is_valid_email_address("ada"));
        assert!(!is_valid_email_address("ada@example"));
        assert!(!is_valid_email_address("a b@example.com"));
        assert!(!is_valid_email_address("Ada <ada@example.com>"));
    }

    #[test]
    fn infrastructure_failures_hide_details() {
        let err = ServiceError::Repo(RepoError::RowCount {
            op: "delete_user",
            reason: "driver gave up".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "service failed");
        assert!(err.to_string().contains("driver gave up"));
    }

    #[test]
    fn expected_outcomes_keep_their_kind() {
        let not_found = ServiceError::Repo(RepoError::NotFound { op: "delete_email" });
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::UserNotFound(3).kind(), ErrorKind::NotFound);
    }
}
