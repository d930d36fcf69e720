use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        executor::{decode_group_row, require_hkey, unsupported_jump},
        plan::AncestorLookupPlan,
        row::{Row, RowType},
        store::{KeyValueStore, TreeId},
    },
    error::InternalError,
    model::GroupModel,
    obs::OperatorKind,
};
use std::{collections::VecDeque, sync::Arc};

///
/// AncestorLookupCursor
///
/// For each input row of the lookup type, point-reads the requested ancestors
/// from the group tree by hkey prefix, shallowest first.
///

pub(crate) struct AncestorLookupCursor {
    input: Box<dyn Cursor>,
    group: Arc<GroupModel>,
    store: Arc<dyn KeyValueStore>,
    input_type: RowType,
    // (hkey depth, type), shallowest first
    ancestors: Vec<(usize, RowType)>,
    keep_input: bool,
    pending: VecDeque<Row>,
    lifecycle: CursorLifecycle,
}

impl AncestorLookupCursor {
    pub(crate) fn new(plan: &AncestorLookupPlan, input: Box<dyn Cursor>, ctx: &ExecContext) -> Self {
        let ancestors = plan
            .ancestor_types
            .iter()
            .map(|row_type| {
                let depth = row_type.table_model().map_or(0, |table| table.depth());
                (depth, row_type.clone())
            })
            .collect();

        Self {
            input,
            group: Arc::clone(&plan.group),
            store: Arc::clone(&ctx.store),
            input_type: plan.input_type.clone(),
            ancestors,
            keep_input: plan.keep_input,
            pending: VecDeque::new(),
            lifecycle: CursorLifecycle::new(OperatorKind::AncestorLookup),
        }
    }

    fn lookup_ancestors(&mut self, row: &Row) -> Result<(), InternalError> {
        let hkey = require_hkey(row, "ancestor lookup")?;

        for (depth, row_type) in &self.ancestors {
            // the row is itself an orphan above this depth
            if hkey.depth() < *depth {
                continue;
            }
            let key = hkey.prefix(*depth)?.to_bytes();

            self.lifecycle.storage_seek();
            let Some(bytes) = self.store.get(TreeId::Group(self.group.id), &key)? else {
                continue;
            };
            let ancestor = decode_group_row(&self.group, &bytes)?;
            if ancestor.row_type() != row_type {
                return Err(InternalError::store_corruption(format!(
                    "{} found at hkey {} where {row_type} was expected",
                    ancestor.row_type(),
                    hkey.prefix(*depth)?
                )));
            }
            self.pending.push_back(ancestor);
        }

        Ok(())
    }
}

impl Cursor for AncestorLookupCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.pending.clear();
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;

        let row = loop {
            if let Some(row) = self.pending.pop_front() {
                break Some(row);
            }
            let Some(row) = self.input.next()? else {
                break None;
            };

            if row.row_type() == &self.input_type {
                self.lookup_ancestors(&row)?;
            }
            if self.keep_input {
                self.pending.push_back(row);
            }
        };

        Ok(self.lifecycle.emit(row))
    }

    fn jump(&mut self, _target: &Row, _selector: ColumnSelector) -> Result<(), InternalError> {
        unsupported_jump(&self.lifecycle, "ancestor lookup")
    }

    fn close(&mut self) -> Result<(), InternalError> {
        if self.lifecycle.close() {
            self.pending.clear();
        }

        self.input.close()
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
