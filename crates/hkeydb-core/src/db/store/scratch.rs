use crate::{
    db::store::{KeyValueStore, TreeId},
    error::InternalError,
    obs::sink::{MetricsEvent, record},
};
use std::sync::Arc;

///
/// ScratchTree
///
/// Owning handle for one operator-private scratch tree. Released explicitly
/// through `release`, or on drop if the owner never got that far.
///

pub struct ScratchTree {
    store: Arc<dyn KeyValueStore>,
    tree: TreeId,
    released: bool,
}

impl ScratchTree {
    pub fn allocate(store: &Arc<dyn KeyValueStore>) -> Result<Self, InternalError> {
        let tree = store.allocate_scratch()?;
        record(MetricsEvent::ScratchAllocated);

        Ok(Self {
            store: Arc::clone(store),
            tree,
            released: false,
        })
    }

    #[must_use]
    pub const fn tree(&self) -> TreeId {
        self.tree
    }

    pub fn release(mut self) -> Result<(), InternalError> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<(), InternalError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.store.release_scratch(self.tree)?;
        record(MetricsEvent::ScratchReleased);

        Ok(())
    }
}

impl Drop for ScratchTree {
    fn drop(&mut self) {
        // Errors cannot surface from drop; the explicit path reports them.
        let _ = self.release_inner();
    }
}
