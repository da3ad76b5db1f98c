//! Generic statement execution primitives.
//!
//! # Responsibility
//! - Run parameterized writes inside a caller-owned transaction and reads on
//!   any connection handle.
//! - Translate driver failures into [`RepoError`] variants.
//!
//! # Invariants
//! - No statement starts once the caller's context is done.
//! - A running statement is interrupted when the context becomes done.
//! - Nothing is retried; the first failure is returned.
//! - `select` never returns a partial list.

use crate::context::{CancelReason, Context, InterruptGuard};
use crate::model::user::is_valid_id;
use crate::repo::error::{RepoError, RepoResult, ScanResult};
use rusqlite::{ffi, Connection, ErrorCode, Params, Row, Transaction};
use std::collections::HashMap;

/// Runs an insert and returns the store-assigned id.
///
/// `sql` must end with `RETURNING id`, so the identifier is read back as a
/// separate, fallible step after the row is written.
pub fn insert<P: Params>(
    ctx: &Context,
    tx: &Transaction<'_>,
    op: &'static str,
    sql: &str,
    params: P,
) -> RepoResult<i64> {
    ensure_active(ctx, op)?;
    let _interrupt = InterruptGuard::install(tx, ctx);
    let fail = |err: rusqlite::Error| classify_write(ctx, op, err);

    let mut stmt = tx.prepare(sql).map_err(fail)?;
    let mut rows = stmt.query(params).map_err(fail)?;
    let row = rows
        .next()
        .map_err(fail)?
        .ok_or_else(|| RepoError::IdentifierRetrieval {
            op,
            reason: "statement returned no identifier row".to_string(),
        })?;

    let id: i64 = row
        .get(0)
        .map_err(|err| RepoError::IdentifierRetrieval {
            op,
            reason: err.to_string(),
        })?;
    if !is_valid_id(id) {
        return Err(RepoError::IdentifierRetrieval {
            op,
            reason: format!("store returned non-positive id {id}"),
        });
    }

    Ok(id)
}

/// Runs an id-scoped delete. Zero affected rows is [`RepoError::NotFound`].
pub fn delete<P: Params>(
    ctx: &Context,
    tx: &Transaction<'_>,
    op: &'static str,
    sql: &str,
    params: P,
) -> RepoResult<()> {
    mutate(ctx, tx, op, sql, params)
}

/// Runs an id-scoped update with the same row-count contract as [`delete`].
pub fn update<P: Params>(
    ctx: &Context,
    tx: &Transaction<'_>,
    op: &'static str,
    sql: &str,
    params: P,
) -> RepoResult<()> {
    mutate(ctx, tx, op, sql, params)
}

/// Runs a read query and maps every row with `mapper`.
///
/// Fails on the first row the mapper rejects.
pub fn select<T, P, F>(
    ctx: &Context,
    conn: &Connection,
    op: &'static str,
    sql: &str,
    params: P,
    mapper: F,
) -> RepoResult<Vec<T>>
where
    P: Params,
    F: Fn(&Row<'_>) -> ScanResult<T>,
{
    ensure_active(ctx, op)?;
    let _interrupt = InterruptGuard::install(conn, ctx);
    let fail = |err: rusqlite::Error| classify_read(ctx, op, err);

    let mut stmt = conn.prepare(sql).map_err(fail)?;
    let mut rows = stmt.query(params).map_err(fail)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next().map_err(fail)? {
        let item = mapper(row).map_err(|source| RepoError::Scan { op, source })?;
        items.push(item);
    }

    Ok(items)
}

/// Builds `?, ?, ?` for an `IN (...)` list of `count` values.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Sorts `items` into the order their keys first appear in `ids`.
///
/// Items whose key is not in `ids` go last.
pub fn order_by_ids<T>(items: &mut [T], ids: &[i64], key: impl Fn(&T) -> i64) {
    let mut positions = HashMap::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
        positions.entry(*id).or_insert(position);
    }
    items.sort_by_key(|item| positions.get(&key(item)).copied().unwrap_or(usize::MAX));
}

fn mutate<P: Params>(
    ctx: &Context,
    tx: &Transaction<'_>,
    op: &'static str,
    sql: &str,
    params: P,
) -> RepoResult<()> {
    ensure_active(ctx, op)?;
    let _interrupt = InterruptGuard::install(tx, ctx);

    let affected = match tx.execute(sql, params) {
        Ok(affected) => affected,
        Err(rusqlite::Error::ExecuteReturnedResults) => {
            return Err(RepoError::RowCount {
                op,
                reason: "statement returned rows instead of a change count".to_string(),
            });
        }
        Err(err) => return Err(classify_write(ctx, op, err)),
    };

    if affected == 0 {
        return Err(RepoError::NotFound { op });
    }

    Ok(())
}

fn ensure_active(ctx: &Context, op: &'static str) -> RepoResult<()> {
    match ctx.err() {
        Some(reason) => Err(RepoError::Cancelled { op, reason }),
        None => Ok(()),
    }
}

fn classify_write(ctx: &Context, op: &'static str, err: rusqlite::Error) -> RepoError {
    if is_interrupted(&err) {
        return cancelled(ctx, op);
    }
    if is_unique_violation(&err) {
        return RepoError::AlreadyExists { op, source: err };
    }
    RepoError::Execution { op, source: err }
}

fn classify_read(ctx: &Context, op: &'static str, err: rusqlite::Error) -> RepoError {
    if is_interrupted(&err) {
        return cancelled(ctx, op);
    }
    RepoError::Query { op, source: err }
}

fn cancelled(ctx: &Context, op: &'static str) -> RepoError {
    RepoError::Cancelled {
        op,
        reason: ctx.err().unwrap_or(CancelReason::Cancelled),
    }
}

fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::OperationInterrupted
    )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || inner.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
