use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        direction::Direction,
        executor::{decode_group_row, require_hkey},
        plan::GroupScanPlan,
        row::Row,
        store::{KeyValueStore, TreeId},
    },
    error::InternalError,
    model::GroupModel,
    obs::OperatorKind,
};
use std::{ops::Bound, sync::Arc};

///
/// GroupScanCursor
///
/// Every row of one group in full hkey order.
///

pub(crate) struct GroupScanCursor {
    group: Arc<GroupModel>,
    store: Arc<dyn KeyValueStore>,
    lower: Bound<Vec<u8>>,
    lifecycle: CursorLifecycle,
}

impl GroupScanCursor {
    pub(crate) fn new(plan: &GroupScanPlan, ctx: &ExecContext) -> Self {
        Self {
            group: Arc::clone(&plan.group),
            store: Arc::clone(&ctx.store),
            lower: Bound::Unbounded,
            lifecycle: CursorLifecycle::new(OperatorKind::GroupScan),
        }
    }

    fn tree(&self) -> TreeId {
        TreeId::Group(self.group.id)
    }
}

impl Cursor for GroupScanCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.lower = Bound::Unbounded;

        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;

        self.lifecycle.storage_seek();
        let entry = self.store.seek(
            self.tree(),
            self.lower.as_ref().map(Vec::as_slice),
            Bound::Unbounded,
            Direction::Asc,
        )?;
        let row = match entry {
            Some((key, value)) => {
                let row = decode_group_row(&self.group, &value)?;
                self.lower = Bound::Excluded(key);
                Some(row)
            }
            None => None,
        };

        Ok(self.lifecycle.emit(row))
    }

    // The selector counts hkey values; a partially selected segment is
    // dropped, so the scan resumes at the deepest wholly selected ancestor.
    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError> {
        self.lifecycle.ensure_open("jump")?;
        let hkey = require_hkey(target, "group scan jump")?;
        let selected = selector.width(hkey.values().len());
        let hkey = hkey.prefix(hkey.whole_segments_within(selected))?;
        self.lower = Bound::Included(hkey.to_bytes());

        Ok(())
    }

    fn close(&mut self) -> Result<(), InternalError> {
        self.lifecycle.close();

        Ok(())
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
