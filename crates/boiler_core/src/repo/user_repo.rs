//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Translate user operations into SQL through the shared executor.
//! - Own the `users` column list and the mapper that reads it.
//!
//! # Invariants
//! - `USER_COLUMNS` and `scan_user` agree on column order.
//! - Writes never open, commit or roll back a transaction.
//! - `fetch_users` with no ids never touches the store.

use crate::context::Context;
use crate::model::filter::UsersFilter;
use crate::model::user::{User, UserId};
use crate::repo::error::{RepoResult, ScanResult};
use crate::repo::executor::{self, order_by_ids, placeholders};
use crate::repo::scan::{column, id_column, scan_id};
use crate::repo::storage::SqliteStorage;
use crate::repo::NOW_MS_SQL;
use rusqlite::{params, params_from_iter, Row, Transaction};

/// Columns read by [`scan_user`], in scan order.
pub const USER_COLUMNS: [&str; 4] = ["id", "name", "created_at", "updated_at"];

/// Repository interface for user persistence.
pub trait UserRepository {
    /// Inserts a user stamped with the store's current time.
    fn add_user(&self, ctx: &Context, tx: &Transaction<'_>, name: &str) -> RepoResult<UserId>;
    /// Deletes one user; a missing id is `NotFound`.
    fn delete_user(&self, ctx: &Context, tx: &Transaction<'_>, user_id: UserId)
        -> RepoResult<()>;
    /// Returns ids owning `filter.email`, or a bounded scan when it is unset or empty.
    fn filter_users_id(&self, ctx: &Context, filter: &UsersFilter) -> RepoResult<Vec<UserId>>;
    /// Loads users in the order of `ids`. Unknown ids are skipped.
    fn fetch_users(&self, ctx: &Context, ids: &[UserId]) -> RepoResult<Vec<User>>;
}

impl UserRepository for SqliteStorage<'_> {
    fn add_user(&self, ctx: &Context, tx: &Transaction<'_>, name: &str) -> RepoResult<UserId> {
        executor::insert(
            ctx,
            tx,
            "add_user",
            &format!(
                "INSERT INTO users (name, created_at, updated_at)
                 VALUES (?1, {NOW_MS_SQL}, {NOW_MS_SQL})
                 RETURNING id"
            ),
            params![name],
        )
    }

    fn delete_user(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        user_id: UserId,
    ) -> RepoResult<()> {
        executor::delete(
            ctx,
            tx,
            "delete_user",
            "DELETE FROM users WHERE id = ?1",
            params![user_id],
        )
    }

    fn filter_users_id(&self, ctx: &Context, filter: &UsersFilter) -> RepoResult<Vec<UserId>> {
        match filter.email.as_deref().filter(|address| !address.is_empty()) {
            Some(address) => executor::select(
                ctx,
                self.conn(),
                "filter_users_id",
                "SELECT u.id
                 FROM users u
                 INNER JOIN emails e ON e.user_id = u.id
                 WHERE e.address = ?1
                 ORDER BY u.id ASC",
                params![address],
                scan_id,
            ),
            None => executor::select(
                ctx,
                self.conn(),
                "filter_users_id",
                "SELECT id FROM users ORDER BY id ASC LIMIT ?1",
                params![i64::from(filter.applied_limit())],
                scan_id,
            ),
        }
    }

    fn fetch_users(&self, ctx: &Context, ids: &[UserId]) -> RepoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM users WHERE id IN ({})",
            USER_COLUMNS.join(", "),
            placeholders(ids.len()),
        );
        let mut users = executor::select(
            ctx,
            self.conn(),
            "fetch_users",
            &sql,
            params_from_iter(ids.iter()),
            scan_user,
        )?;
        order_by_ids(&mut users, ids, |user| user.id);
        Ok(users)
    }
}

/// Maps one row selected with [`USER_COLUMNS`] into a [`User`].
pub fn scan_user(row: &Row<'_>) -> ScanResult<User> {
    Ok(User {
        id: id_column(row, 0, USER_COLUMNS[0])?,
        name: column(row, 1, USER_COLUMNS[1])?,
        created_at: column(row, 2, USER_COLUMNS[2])?,
        updated_at: column(row, 3, USER_COLUMNS[3])?,
    })
}
