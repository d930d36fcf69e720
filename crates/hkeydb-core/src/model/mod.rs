//! Module: model
//! Responsibility: schema catalog for groups, tables, and indexes.
//! Does not own: storage layout or row encoding.
//! Boundary: built once through `SchemaBuilder`, read-only afterwards.

mod index;
mod schema;
mod table;


use serde::{Deserialize, Serialize};
use std::fmt;

// re-exports
pub use index::{IndexColumn, IndexJoinType, IndexKind, IndexModel};
pub use schema::{GroupModel, ParentSpec, Schema, SchemaBuilder, SchemaError};
pub use table::{TableModel, TablePathEntry};

///
/// TableId
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TableId(pub(crate) u32);

///
/// GroupId
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GroupId(pub(crate) u32);

///
/// IndexId
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct IndexId(pub(crate) u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table#{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index#{}", self.0)
    }
}
