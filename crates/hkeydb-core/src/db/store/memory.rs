use crate::{
    db::{
        direction::Direction,
        store::{KeyValueStore, StoreEntry, TreeId, envelope_is_empty},
    },
    error::InternalError,
};
use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{
        RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};

type Tree = BTreeMap<Vec<u8>, Vec<u8>>;

///
/// MemoryStore
///
/// In-memory ordered store: one `BTreeMap` per tree behind a single lock.
/// Scratch trees exist in the map only between allocate and release.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    trees: RwLock<BTreeMap<TreeId, Tree>>,
    next_scratch: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in one tree.
    pub fn tree_len(&self, tree: TreeId) -> Result<usize, InternalError> {
        Ok(self.read()?.get(&tree).map_or(0, BTreeMap::len))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<TreeId, Tree>>, InternalError> {
        self.trees
            .read()
            .map_err(|_| InternalError::store_internal("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<TreeId, Tree>>, InternalError> {
        self.trees
            .write()
            .map_err(|_| InternalError::store_internal("memory store lock poisoned"))
    }
}

// Scratch trees must be allocated before use; persistent trees appear on
// first write.
fn tree_for_write(
    trees: &mut BTreeMap<TreeId, Tree>,
    tree: TreeId,
) -> Result<&mut Tree, InternalError> {
    if tree.is_scratch() {
        return trees.get_mut(&tree).ok_or_else(|| {
            InternalError::store_invariant(format!("{tree} is not allocated"))
        });
    }

    Ok(trees.entry(tree).or_default())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, tree: TreeId, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        Ok(self
            .read()?
            .get(&tree)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn put(
        &self,
        tree: TreeId,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, InternalError> {
        let mut trees = self.write()?;

        Ok(tree_for_write(&mut trees, tree)?.insert(key, value))
    }

    fn remove(&self, tree: TreeId, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        let mut trees = self.write()?;

        Ok(trees.get_mut(&tree).and_then(|entries| entries.remove(key)))
    }

    fn clear_tree(&self, tree: TreeId) -> Result<(), InternalError> {
        if let Some(entries) = self.write()?.get_mut(&tree) {
            entries.clear();
        }

        Ok(())
    }

    fn seek(
        &self,
        tree: TreeId,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        direction: Direction,
    ) -> Result<Option<StoreEntry>, InternalError> {
        // BTreeMap::range panics on inverted bounds.
        if envelope_is_empty(lower, upper) {
            return Ok(None);
        }

        let trees = self.read()?;
        let Some(entries) = trees.get(&tree) else {
            return Ok(None);
        };
        let mut range = entries.range::<[u8], _>((lower, upper));
        let entry = match direction {
            Direction::Asc => range.next(),
            Direction::Desc => range.next_back(),
        };

        Ok(entry.map(|(key, value)| (key.clone(), value.clone())))
    }

    fn allocate_scratch(&self) -> Result<TreeId, InternalError> {
        let tree = TreeId::Scratch(self.next_scratch.fetch_add(1, AtomicOrdering::Relaxed));
        self.write()?.insert(tree, Tree::new());

        Ok(tree)
    }

    fn release_scratch(&self, tree: TreeId) -> Result<(), InternalError> {
        if !tree.is_scratch() {
            return Err(InternalError::store_invariant(format!(
                "cannot release non-scratch {tree}"
            )));
        }
        self.write()?.remove(&tree);

        Ok(())
    }

    fn scratch_tree_count(&self) -> Result<usize, InternalError> {
        Ok(self.read()?.keys().filter(|tree| tree.is_scratch()).count())
    }
}
