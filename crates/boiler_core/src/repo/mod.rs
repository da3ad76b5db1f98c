//! Repository layer: typed data access over the accounts store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for users and emails.
//! - Execute SQL through one generic executor and classify every failure.
//! - Keep SQL details away from service orchestration.
//!
//! # Invariants
//! - Writes take an explicit caller-owned transaction.
//! - Errors are classified here and passed up unchanged in kind.
//! - A targeted mutation that matches no row is `NotFound`, never success.

pub mod email_repo;
pub mod error;
pub mod executor;
pub mod scan;
pub mod storage;
pub mod user_repo;

/// SQL expression for the store's current time in epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";
