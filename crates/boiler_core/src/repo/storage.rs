//! SQLite storage handle shared by the user and email repositories.
//!
//! # Responsibility
//! - Verify that a connection carries the schema the mappers expect.
//! - Open transactions for the service layer; never commit them itself.
//!
//! # Invariants
//! - Holds only a shared connection borrow, no mutable state of its own.
//! - Writes run on a caller-supplied transaction; reads run on the plain
//!   connection and see that connection's uncommitted writes.

use crate::db::migrations::{current_user_version, latest_version};
use crate::repo::email_repo::{EmailRepository, EMAIL_COLUMNS};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::user_repo::{UserRepository, USER_COLUMNS};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Full repository surface required by the service layer.
pub trait Storage: UserRepository + EmailRepository {
    /// Opens a write transaction. The caller owns commit and rollback.
    fn begin(&self) -> RepoResult<Transaction<'_>>;
}

/// SQLite-backed storage over one migrated connection.
///
/// Not `Sync`: give every concurrent request path its own connection.
pub struct SqliteStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStorage<'conn> {
    /// Constructs storage from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema does
    ///   not carry every column the mappers read.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

impl Storage for SqliteStorage<'_> {
    fn begin(&self) -> RepoResult<Transaction<'_>> {
        Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate).map_err(|source| {
            RepoError::Execution {
                op: "begin",
                source,
            }
        })
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let required: [(&'static str, &[&'static str]); 2] =
        [("users", &USER_COLUMNS), ("emails", &EMAIL_COLUMNS)];
    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        let present = table_columns(conn, table)?;
        for &column in columns {
            if !present.iter().any(|name| name.as_str() == column) {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )
        .map_err(|source| RepoError::Query {
            op: "schema_check",
            source,
        })?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let read = || -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(row.get(1)?);
        }
        Ok(columns)
    };
    read().map_err(|source| RepoError::Query {
        op: "schema_check",
        source,
    })
}
