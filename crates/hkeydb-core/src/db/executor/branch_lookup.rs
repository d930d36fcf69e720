use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        direction::Direction,
        executor::{decode_group_row, require_hkey, unsupported_jump},
        plan::BranchLookupPlan,
        row::{Row, RowType},
        store::{KeyValueStore, TreeId, owned_bound_ref, prefix_envelope},
    },
    error::InternalError,
    model::GroupModel,
    obs::OperatorKind,
    value::Value,
};
use std::{ops::Bound, sync::Arc};

///
/// BranchLookupCursor
///
/// For each input row of the lookup type, streams the branch rooted at the
/// related output-type row: that row and every descendant, in hkey order.
/// Orphans under the branch root's hkey are included even when the root
/// row itself is absent.
///

pub(crate) struct BranchLookupCursor {
    input: Box<dyn Cursor>,
    group: Arc<GroupModel>,
    store: Arc<dyn KeyValueStore>,
    input_type: RowType,
    common_depth: usize,
    branch_ordinal: Option<u32>,
    keep_input: bool,
    input_precedes_branch: bool,
    // envelope of the branch being streamed
    branch: Option<(Bound<Vec<u8>>, Bound<Vec<u8>>)>,
    // kept input row waiting for the end of its branch
    trailing: Option<Row>,
    lifecycle: CursorLifecycle,
}

impl BranchLookupCursor {
    pub(crate) fn new(plan: &BranchLookupPlan, input: Box<dyn Cursor>, ctx: &ExecContext) -> Self {
        Self {
            input,
            group: Arc::clone(&plan.group),
            store: Arc::clone(&ctx.store),
            input_type: plan.input_type.clone(),
            common_depth: plan.common_depth,
            branch_ordinal: plan.branch_ordinal,
            keep_input: plan.keep_input,
            input_precedes_branch: plan.input_precedes_branch,
            branch: None,
            trailing: None,
            lifecycle: CursorLifecycle::new(OperatorKind::BranchLookup),
        }
    }

    fn reset(&mut self) {
        self.branch = None;
        self.trailing = None;
    }

    // Shared-ancestor hkey, extended by the branch root's ordinal when the
    // root is a child of that ancestor.
    fn branch_envelope(
        &self,
        row: &Row,
    ) -> Result<Option<(Bound<Vec<u8>>, Bound<Vec<u8>>)>, InternalError> {
        let hkey = require_hkey(row, "branch lookup")?;
        // the row is itself an orphan above the shared ancestor
        if hkey.depth() < self.common_depth {
            return Ok(None);
        }

        let mut root = hkey.prefix(self.common_depth)?;
        if let Some(ordinal) = self.branch_ordinal {
            root.push_segment(ordinal, Vec::<Value>::new())?;
        }

        Ok(Some(prefix_envelope(&root.to_bytes())))
    }

    fn next_branch_row(&mut self) -> Result<Option<Row>, InternalError> {
        let Some((lower, upper)) = self.branch.as_ref() else {
            return Ok(None);
        };

        self.lifecycle.storage_seek();
        let entry = self.store.seek(
            TreeId::Group(self.group.id),
            owned_bound_ref(lower),
            owned_bound_ref(upper),
            Direction::Asc,
        )?;
        let Some((key, value)) = entry else {
            self.branch = None;
            return Ok(None);
        };
        let row = decode_group_row(&self.group, &value)?;
        if let Some((lower, _)) = self.branch.as_mut() {
            *lower = Bound::Excluded(key);
        }

        Ok(Some(row))
    }
}

impl Cursor for BranchLookupCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.reset();
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;

        let row = loop {
            if self.branch.is_some() {
                if let Some(row) = self.next_branch_row()? {
                    break Some(row);
                }
                if let Some(row) = self.trailing.take() {
                    break Some(row);
                }
                continue;
            }

            let Some(row) = self.input.next()? else {
                break None;
            };
            if row.row_type() != &self.input_type {
                if self.keep_input {
                    break Some(row);
                }
                continue;
            }

            self.branch = self.branch_envelope(&row)?;
            if self.keep_input {
                if self.input_precedes_branch || self.branch.is_none() {
                    break Some(row);
                }
                self.trailing = Some(row);
            }
        };

        Ok(self.lifecycle.emit(row))
    }

    fn jump(&mut self, _target: &Row, _selector: ColumnSelector) -> Result<(), InternalError> {
        unsupported_jump(&self.lifecycle, "branch lookup")
    }

    fn close(&mut self) -> Result<(), InternalError> {
        if self.lifecycle.close() {
            self.reset();
        }

        self.input.close()
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
