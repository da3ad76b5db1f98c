//! Error taxonomy for the storage boundary.
//!
//! Every variant names the repository operation that failed and keeps the
//! driver error as its source, so callers can branch on the variant and
//! operators still see the full cause.

use crate::context::CancelReason;
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;
pub type ScanResult<T> = Result<T, ScanError>;

/// Classified storage failure.
#[derive(Debug)]
pub enum RepoError {
    /// A write statement failed to run.
    Execution {
        op: &'static str,
        source: rusqlite::Error,
    },
    /// The insert ran but the store-assigned id could not be read back.
    IdentifierRetrieval { op: &'static str, reason: String },
    /// The mutation ran but its affected-row count is unavailable.
    RowCount { op: &'static str, reason: String },
    /// A targeted mutation matched no row.
    NotFound { op: &'static str },
    /// An insert violated a uniqueness constraint.
    AlreadyExists {
        op: &'static str,
        source: rusqlite::Error,
    },
    /// A read statement failed to run.
    Query {
        op: &'static str,
        source: rusqlite::Error,
    },
    /// A result row could not be mapped to its entity.
    Scan { op: &'static str, source: ScanError },
    /// The caller's context was done before or during the statement.
    Cancelled {
        op: &'static str,
        reason: CancelReason,
    },
    /// The connection has not been migrated to the schema this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    Db(DbError),
}

impl RepoError {
    /// Operation name attached to statement-level failures.
    pub fn op(&self) -> Option<&'static str> {
        match self {
            Self::Execution { op, .. }
            | Self::IdentifierRetrieval { op, .. }
            | Self::RowCount { op, .. }
            | Self::NotFound { op }
            | Self::AlreadyExists { op, .. }
            | Self::Query { op, .. }
            | Self::Scan { op, .. }
            | Self::Cancelled { op, .. } => Some(*op),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::Db(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execution { op, source } => write!(f, "{op}: could not execute; {source}"),
            Self::IdentifierRetrieval { op, reason } => {
                write!(f, "{op}: fail to retrieve inserted id; {reason}")
            }
            Self::RowCount { op, reason } => {
                write!(f, "{op}: could not fetch rows affected; {reason}")
            }
            Self::NotFound { op } => write!(f, "{op}: not found"),
            Self::AlreadyExists { op, source } => write!(f, "{op}: already exists; {source}"),
            Self::Query { op, source } => write!(f, "{op}: could not fetch rows; {source}"),
            Self::Scan { op, source } => write!(f, "{op}: {source}"),
            Self::Cancelled { op, reason } => write!(f, "{op}: {reason}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Execution { source, .. }
            | Self::AlreadyExists { source, .. }
            | Self::Query { source, .. } => Some(source),
            Self::Scan { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::IdentifierRetrieval { .. }
            | Self::RowCount { .. }
            | Self::NotFound { .. }
            | Self::Cancelled { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Failure to turn one result row into a typed value.
#[derive(Debug)]
pub enum ScanError {
    /// The driver could not read or convert the column.
    Column {
        index: usize,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The column was read but holds a value the entity forbids.
    InvalidValue {
        name: &'static str,
        message: String,
    },
}

impl Display for ScanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column { index, name, source } => {
                write!(f, "could not scan column {index} (`{name}`); {source}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value in column `{name}`: {message}")
            }
        }
    }
}

impl Error for ScanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Column { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}
