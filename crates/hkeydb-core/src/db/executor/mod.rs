//! Module: db::executor
//! Responsibility: cursor implementations of every physical operator.
//! Does not own: plan validation (see `plan`) or key encodings.
//! Boundary: cursors read storage only through `KeyValueStore`.

mod ancestor_lookup;
mod branch_lookup;
mod filter;
mod flatten;
mod group_scan;
mod index_scan;
mod intersect;
mod sort;
mod union;

#[cfg(test)]
mod tests;

// re-exports
pub(crate) use ancestor_lookup::AncestorLookupCursor;
pub(crate) use branch_lookup::BranchLookupCursor;
pub(crate) use filter::FilterCursor;
pub(crate) use flatten::FlattenCursor;
pub(crate) use group_scan::GroupScanCursor;
pub(crate) use index_scan::IndexScanCursor;
pub(crate) use intersect::IntersectCursor;
pub(crate) use sort::{SortInsertionLimitedCursor, SortTreeCursor};
pub(crate) use union::UnionCursor;

use crate::{
    db::{
        cursor::{Cursor, CursorLifecycle},
        data::StoredRow,
        hkey::HKey,
        row::Row,
    },
    error::InternalError,
    model::GroupModel,
};

/// Reject `jump` on operators whose output order is not jump-addressable.
fn unsupported_jump(lifecycle: &CursorLifecycle, operator: &str) -> Result<(), InternalError> {
    lifecycle.ensure_open("jump")?;

    Err(InternalError::executor_unsupported(format!(
        "{operator} does not support jump"
    )))
}

/// Close an input cursor, keeping the first error seen.
fn close_input(input: &mut dyn Cursor, first_error: &mut Option<InternalError>) {
    if let Err(err) = input.close() {
        first_error.get_or_insert(err);
    }
}

/// Hkey of a storage-sourced row, or an invariant error naming the operator.
fn require_hkey<'a>(row: &'a Row, operator: &str) -> Result<&'a HKey, InternalError> {
    row.hkey().ok_or_else(|| {
        InternalError::executor_invariant(format!("{operator} received row {row} without an hkey"))
    })
}

/// Decode one group-tree payload; the row type follows from the hkey's
/// deepest ordinal.
fn decode_group_row(group: &GroupModel, bytes: &[u8]) -> Result<Row, InternalError> {
    let stored = StoredRow::decode(bytes)?;
    let hkey = stored.hkey.ok_or_else(|| {
        InternalError::store_corruption(format!("{} row stored without hkey", group.name))
    })?;
    let row_type = hkey
        .last_ordinal()
        .and_then(|ordinal| group.table_type_by_ordinal(ordinal))
        .ok_or_else(|| {
            InternalError::store_corruption(format!(
                "hkey {hkey} names no table of group {}",
                group.name
            ))
        })?;
    if stored.values.len() != row_type.width() {
        return Err(InternalError::store_corruption(format!(
            "{row_type} row has {} values, expected {}",
            stored.values.len(),
            row_type.width()
        )));
    }

    Ok(Row::new(row_type.clone(), stored.values, Some(hkey)))
}
