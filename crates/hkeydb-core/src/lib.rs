//! Core runtime for hkeydb: hierarchical keys, the cursor protocol, and the
//! hkey-ordered physical operators exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod serialize;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Maximum number of segments in one hierarchical key.
pub const MAX_HKEY_DEPTH: usize = 16;

/// Maximum encoded size of one stored row or index entry payload.
pub const MAX_PAYLOAD_BYTES: usize = 256 * 1024;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No stores, codecs, or executor internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        config::ExecConfig,
        db::{
            Database,
            cursor::{ColumnSelector, Cursor, CursorState, ExecContext},
            direction::Direction,
            hkey::HKey,
            plan::{
                DuplicatePolicy, FlattenOption, IndexBound, IndexKeyRange, IndexOrdering,
                IndexScanSelector, IntersectOption, JoinType, Operator, SortOrdering,
            },
            row::{Row, RowType},
        },
        error::InternalError,
        model::{GroupId, IndexId, IndexJoinType, Schema, SchemaBuilder, TableId},
        value::Value,
    };
}
