//! Module: db::store
//! Responsibility: ordered byte-keyed trees behind the `KeyValueStore` seam.
//! Does not own: key encoding, row payload shape, or cursor positioning.
//! Boundary: every operator reaches storage through `seek` and point reads.

mod envelope;
mod memory;
mod scratch;


use crate::{
    db::direction::Direction,
    error::InternalError,
    model::{GroupId, IndexId, TableId},
};
use std::{fmt, ops::Bound};

// re-exports
pub(crate) use envelope::{envelope_is_empty, owned_bound_ref, prefix_envelope, tighter_lower, tighter_upper};
pub use memory::MemoryStore;
pub use scratch::ScratchTree;

/// One stored `(key, value)` pair.
pub type StoreEntry = (Vec<u8>, Vec<u8>);

///
/// TreeId
///
/// Address of one ordered tree in a store.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TreeId {
    /// Group rows keyed by encoded hkey.
    Group(GroupId),
    /// Index entries keyed by encoded index row.
    Index(IndexId),
    /// Primary key to stored hkey, per table.
    PrimaryKey(TableId),
    /// Operator-private scratch space.
    Scratch(u64),
}

impl TreeId {
    #[must_use]
    pub const fn is_scratch(self) -> bool {
        matches!(self, Self::Scratch(_))
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group_tree({id})"),
            Self::Index(id) => write!(f, "index_tree({id})"),
            Self::PrimaryKey(id) => write!(f, "pk_tree({id})"),
            Self::Scratch(id) => write!(f, "scratch_tree({id})"),
        }
    }
}

///
/// KeyValueStore
///
/// Ordered key-value storage consumed by the writer and every cursor.
/// Implementations must be shareable across threads; cursors hold an `Arc`.
///

pub trait KeyValueStore: Send + Sync {
    fn get(&self, tree: TreeId, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError>;

    /// Insert or replace one entry, returning the previous value.
    fn put(
        &self,
        tree: TreeId,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, InternalError>;

    fn remove(&self, tree: TreeId, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError>;

    fn clear_tree(&self, tree: TreeId) -> Result<(), InternalError>;

    /// First entry of the `[lower, upper]` envelope in `direction`.
    ///
    /// Empty envelopes (including inverted ones) return `None`.
    fn seek(
        &self,
        tree: TreeId,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        direction: Direction,
    ) -> Result<Option<StoreEntry>, InternalError>;

    fn allocate_scratch(&self) -> Result<TreeId, InternalError>;

    fn release_scratch(&self, tree: TreeId) -> Result<(), InternalError>;

    /// Number of scratch trees currently allocated.
    fn scratch_tree_count(&self) -> Result<usize, InternalError>;
}
