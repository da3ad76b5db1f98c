//! Email repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Translate email operations into SQL through the shared executor.
//! - Own the `emails` column list and the mapper that reads it.
//!
//! # Invariants
//! - A duplicate address surfaces as `AlreadyExists`, not `Execution`.
//! - An unknown owner surfaces as `Execution` (foreign key failure).
//! - `EMAIL_COLUMNS` and `scan_email` agree on column order.

use crate::context::Context;
use crate::model::email::{Email, EmailId};
use crate::model::filter::EmailsFilter;
use crate::model::user::UserId;
use crate::repo::error::{RepoResult, ScanResult};
use crate::repo::executor::{self, order_by_ids, placeholders};
use crate::repo::scan::{column, id_column};
use crate::repo::storage::SqliteStorage;
use crate::repo::NOW_MS_SQL;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row, Transaction};

/// Columns read by [`scan_email`], in scan order.
pub const EMAIL_COLUMNS: [&str; 5] = ["id", "user_id", "address", "created_at", "updated_at"];

/// Repository interface for email persistence.
pub trait EmailRepository {
    /// Attaches `address` to `user_id` and returns the new email id.
    fn add_email(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        user_id: UserId,
        address: &str,
    ) -> RepoResult<EmailId>;
    /// Deletes one email; a missing id is `NotFound`.
    fn delete_email(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        email_id: EmailId,
    ) -> RepoResult<()>;
    /// Returns emails matching every criterion set on `filter`, by id.
    fn filter_emails(&self, ctx: &Context, filter: &EmailsFilter) -> RepoResult<Vec<Email>>;
    /// Loads emails in the order of `ids`. Unknown ids are skipped.
    fn fetch_emails(&self, ctx: &Context, ids: &[EmailId]) -> RepoResult<Vec<Email>>;
}

impl EmailRepository for SqliteStorage<'_> {
    fn add_email(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        user_id: UserId,
        address: &str,
    ) -> RepoResult<EmailId> {
        executor::insert(
            ctx,
            tx,
            "add_email",
            &format!(
                "INSERT INTO emails (user_id, address, created_at, updated_at)
                 VALUES (?1, ?2, {NOW_MS_SQL}, {NOW_MS_SQL})
                 RETURNING id"
            ),
            params![user_id, address],
        )
    }

    fn delete_email(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        email_id: EmailId,
    ) -> RepoResult<()> {
        executor::delete(
            ctx,
            tx,
            "delete_email",
            "DELETE FROM emails WHERE id = ?1",
            params![email_id],
        )
    }

    fn filter_emails(&self, ctx: &Context, filter: &EmailsFilter) -> RepoResult<Vec<Email>> {
        let mut sql = format!("SELECT {} FROM emails WHERE 1 = 1", EMAIL_COLUMNS.join(", "));
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user_id) = filter.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if let Some(email_id) = filter.email_id {
            sql.push_str(" AND id = ?");
            bind_values.push(Value::Integer(email_id));
        }
        if let Some(address) = filter.address.as_ref() {
            sql.push_str(" AND address = ?");
            bind_values.push(Value::Text(address.clone()));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(filter.applied_limit())));

        executor::select(
            ctx,
            self.conn(),
            "filter_emails",
            &sql,
            params_from_iter(bind_values),
            scan_email,
        )
    }

    fn fetch_emails(&self, ctx: &Context, ids: &[EmailId]) -> RepoResult<Vec<Email>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM emails WHERE id IN ({})",
            EMAIL_COLUMNS.join(", "),
            placeholders(ids.len()),
        );
        let mut emails = executor::select(
            ctx,
            self.conn(),
            "fetch_emails",
            &sql,
            params_from_iter(ids.iter()),
            scan_email,
        )?;
        order_by_ids(&mut emails, ids, |email| email.id);
        Ok(emails)
    }
}

/// Maps one row selected with [`EMAIL_COLUMNS`] into an [`Email`].
pub fn scan_email(row: &Row<'_>) -> ScanResult<Email> {
    Ok(Email {
        id: id_column(row, 0, EMAIL_COLUMNS[0])?,
        user_id: id_column(row, 1, EMAIL_COLUMNS[1])?,
        address: column(row, 2, EMAIL_COLUMNS[2])?,
        created_at: column(row, 3, EMAIL_COLUMNS[3])?,
        updated_at: column(row, 4, EMAIL_COLUMNS[4])?,
    })
}
