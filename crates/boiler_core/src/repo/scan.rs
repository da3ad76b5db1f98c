//! Row scanner contract shared by every query path.
//!
//! A mapper is any `Fn(&Row<'_>) -> ScanResult<T>`. Mappers read columns by
//! position, so each one lives next to the column list its queries select.

use crate::model::user::is_valid_id;
use crate::repo::error::{ScanError, ScanResult};
use rusqlite::types::FromSql;
use rusqlite::Row;

/// Reads column `index` as `T`, tagging driver failures with `name`.
pub fn column<T: FromSql>(row: &Row<'_>, index: usize, name: &'static str) -> ScanResult<T> {
    row.get(index)
        .map_err(|source| ScanError::Column { index, name, source })
}

/// Reads an identifier column and rejects values that cannot name a row.
pub fn id_column(row: &Row<'_>, index: usize, name: &'static str) -> ScanResult<i64> {
    let id: i64 = column(row, index, name)?;
    if !is_valid_id(id) {
        return Err(ScanError::InvalidValue {
            name,
            message: format!("identifier must be positive, got {id}"),
        });
    }
    Ok(id)
}

/// Mapper for single-column identifier queries.
pub fn scan_id(row: &Row<'_>) -> ScanResult<i64> {
    id_column(row, 0, "id")
}
