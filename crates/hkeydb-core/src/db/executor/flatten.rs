use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        executor::{require_hkey, unsupported_jump},
        hkey::HKey,
        plan::{FlattenPlan, JoinType},
        row::{Row, RowType},
    },
    error::InternalError,
    model::TableModel,
    obs::OperatorKind,
    value::Value,
};
use std::{collections::VecDeque, iter, sync::Arc};

///
/// PendingParent
///
/// The most recent parent row, held until the input moves past its subtree.
///

enum PendingParent {
    NoParent,
    Pending {
        row: Row,
        /// No child has matched yet; a left-join row may still be owed.
        childless: bool,
        /// Position a first child would occupy: the parent hkey extended
        /// with NULL-keyed segments down to the child table.
        left_join_hkey: HKey,
    },
}

///
/// FlattenCursor
///
/// Hkey-ordered parent/child join. Rows of other types pass through.
///

pub(crate) struct FlattenCursor {
    input: Box<dyn Cursor>,
    parent_type: RowType,
    child_type: RowType,
    output_type: RowType,
    child_table: Option<Arc<TableModel>>,
    join_type: JoinType,
    keep_parent: bool,
    keep_child: bool,
    shortens_hkey: bool,

    parent: PendingParent,
    pending: VecDeque<Row>,
    input_done: bool,
    lifecycle: CursorLifecycle,
}

impl FlattenCursor {
    pub(crate) fn new(plan: &FlattenPlan, input: Box<dyn Cursor>, _ctx: &ExecContext) -> Self {
        Self {
            input,
            parent_type: plan.parent_type.clone(),
            child_type: plan.child_type.clone(),
            output_type: plan.output_type.clone(),
            child_table: plan.child_type.hkey_table().cloned(),
            join_type: plan.join_type,
            keep_parent: plan.keep_parent,
            keep_child: plan.keep_child,
            shortens_hkey: plan.shortens_hkey,
            parent: PendingParent::NoParent,
            pending: VecDeque::new(),
            input_done: false,
            lifecycle: CursorLifecycle::new(OperatorKind::Flatten),
        }
    }

    fn reset(&mut self) {
        self.parent = PendingParent::NoParent;
        self.pending.clear();
        self.input_done = false;
    }

    // A LEFT/FULL stage builds its left-join row from the parent's full
    // hkey, so a parent shortened by an earlier flatten is only accepted
    // when this stage shortens too. INNER/RIGHT stages never build that
    // row and treat a shortened parent as an ordinary unmatched parent.
    fn check_row(&self, row: &Row) -> Result<(), InternalError> {
        if row.row_type() != &self.parent_type
            || !self.join_type.keeps_left()
            || self.shortens_hkey
        {
            return Ok(());
        }

        let hkey = require_hkey(row, "flatten")?;
        let depth = row.row_type().hkey_table().map_or(0, |table| table.depth());
        if hkey.depth() < depth {
            return Err(self.lifecycle.incompatible_row(format!(
                "flatten({}, {}) received {} with shortened hkey {hkey}; \
                 an earlier flatten shortens hkeys, so this one must be configured with \
                 LEFT_JOIN_SHORTENS_HKEY",
                self.parent_type, self.child_type, row
            )));
        }

        Ok(())
    }

    fn ready_for_left_join_row(&self, input_row: Option<&Row>) -> bool {
        let PendingParent::Pending {
            row: parent,
            childless: true,
            left_join_hkey,
        } = &self.parent
        else {
            return false;
        };
        if !self.join_type.keeps_left() {
            return false;
        }
        let Some(row) = input_row else {
            return true;
        };
        if row.row_type() == &self.parent_type {
            return true;
        }

        match (parent.hkey(), row.hkey()) {
            (Some(parent_hkey), Some(hkey)) if parent_hkey.is_prefix_of(hkey) => {
                // A descendant of another type only proves the parent
                // childless once it sorts past where a child would be.
                row.row_type() != &self.child_type && left_join_hkey < hkey
            }
            _ => true,
        }
    }

    fn generate_left_join_row(&mut self) {
        let PendingParent::Pending {
            row,
            childless,
            left_join_hkey,
        } = &mut self.parent
        else {
            return;
        };

        let hkey = if self.shortens_hkey {
            row.hkey().cloned()
        } else {
            Some(left_join_hkey.clone())
        };
        self.pending
            .push_back(Row::flattened(self.output_type.clone(), Some(&*row), None, hkey));
        *childless = false;
    }

    fn set_parent(&mut self, row: Row) -> Result<(), InternalError> {
        let parent_hkey = require_hkey(&row, "flatten")?;
        let mut left_join_hkey = parent_hkey.clone();
        if let Some(child_table) = &self.child_table {
            for entry in child_table.path.iter().skip(parent_hkey.depth()) {
                left_join_hkey
                    .push_segment(entry.ordinal, iter::repeat_n(Value::Null, entry.pk_arity))?;
            }
        }

        self.parent = PendingParent::Pending {
            row,
            childless: true,
            left_join_hkey,
        };

        Ok(())
    }

    fn handle_input_row(&mut self, row: Row) -> Result<(), InternalError> {
        if row.row_type() == &self.parent_type {
            if self.keep_parent {
                self.pending.push_back(row.clone());
            }
            return self.set_parent(row);
        }

        if row.row_type() == &self.child_type {
            if self.keep_child {
                self.pending.push_back(row.clone());
            }

            let matched = match (&mut self.parent, row.hkey()) {
                (
                    PendingParent::Pending {
                        row: parent,
                        childless,
                        ..
                    },
                    Some(child_hkey),
                ) if parent
                    .hkey()
                    .is_some_and(|parent_hkey| parent_hkey.is_prefix_of(child_hkey)) =>
                {
                    *childless = false;
                    Some(Row::flattened(
                        self.output_type.clone(),
                        Some(&*parent),
                        Some(&row),
                        Some(child_hkey.clone()),
                    ))
                }
                _ => None,
            };

            match matched {
                Some(flattened) => self.pending.push_back(flattened),
                None => {
                    // orphan
                    self.parent = PendingParent::NoParent;
                    if self.join_type.keeps_right() {
                        self.pending.push_back(Row::flattened(
                            self.output_type.clone(),
                            None,
                            Some(&row),
                            row.hkey().cloned(),
                        ));
                    }
                }
            }
            return Ok(());
        }

        if let PendingParent::Pending { row: parent, .. } = &self.parent {
            let descends = match (parent.hkey(), row.hkey()) {
                (Some(parent_hkey), Some(hkey)) => parent_hkey.is_prefix_of(hkey),
                _ => false,
            };
            if !descends {
                self.parent = PendingParent::NoParent;
            }
        }
        self.pending.push_back(row);

        Ok(())
    }
}

impl Cursor for FlattenCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.reset();
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;

        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(self.lifecycle.emit(Some(row)));
            }
            if self.input_done && matches!(self.parent, PendingParent::NoParent) {
                return Ok(self.lifecycle.emit(None));
            }

            let input_row = if self.input_done {
                None
            } else {
                self.input.next()?
            };
            if let Some(row) = &input_row {
                self.check_row(row)?;
            } else {
                self.input_done = true;
            }

            if self.ready_for_left_join_row(input_row.as_ref()) {
                self.generate_left_join_row();
            }
            match input_row {
                Some(row) => self.handle_input_row(row)?,
                None => self.parent = PendingParent::NoParent,
            }
        }
    }

    fn jump(&mut self, _target: &Row, _selector: ColumnSelector) -> Result<(), InternalError> {
        unsupported_jump(&self.lifecycle, "flatten")
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
