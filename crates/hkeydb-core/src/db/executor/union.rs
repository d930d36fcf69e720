use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        executor::{
            close_input,
            intersect::{FieldComparator, OrderedInput},
        },
        plan::UnionPlan,
        row::Row,
    },
    error::InternalError,
    obs::OperatorKind,
};
use std::cmp::Ordering;

///
/// UnionCursor
///
/// Ordered merge of two inputs of one index row type. Rows that compare
/// equal are emitted once (the left row) unless both are requested.
///

pub(crate) struct UnionCursor {
    left: OrderedInput,
    right: OrderedInput,
    comparator: FieldComparator,
    output_equal: bool,
    verify_order: bool,
    lifecycle: CursorLifecycle,
}

impl UnionCursor {
    pub(crate) fn new(
        plan: &UnionPlan,
        left: Box<dyn Cursor>,
        right: Box<dyn Cursor>,
        ctx: &ExecContext,
    ) -> Self {
        Self {
            left: OrderedInput::new(left, &plan.row_type, plan.ordering_columns, "union left"),
            right: OrderedInput::new(right, &plan.row_type, plan.ordering_columns, "union right"),
            comparator: FieldComparator {
                directions: plan.directions.clone(),
                fields: plan.directions.len(),
            },
            output_equal: plan.output_equal,
            verify_order: ctx.config.verify_input_order,
            lifecycle: CursorLifecycle::new(OperatorKind::UnionOrdered),
        }
    }

    fn next_row(&mut self) -> Result<Option<Row>, InternalError> {
        self.left
            .ensure_item(&self.comparator, self.verify_order, &self.lifecycle)?;
        self.right
            .ensure_item(&self.comparator, self.verify_order, &self.lifecycle)?;

        // an exhausted side always compares after the other
        let ordering = match (self.left.item.as_ref(), self.right.item.as_ref()) {
            (None, None) => return Ok(None),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(left), Some(right)) => self.comparator.compare(
                self.left.compared(left, &self.comparator),
                self.right.compared(right, &self.comparator),
            ),
        };

        let row = match ordering {
            Ordering::Less => self.left.take_item(&self.comparator),
            Ordering::Greater => self.right.take_item(&self.comparator),
            Ordering::Equal => {
                if !self.output_equal {
                    self.right.clear_item(&self.comparator);
                }
                self.left.take_item(&self.comparator)
            }
        };

        Ok(row)
    }
}

impl Cursor for UnionCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.left.reset();
        self.right.reset();
        self.left.cursor.open()?;
        self.right.cursor.open()
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;
        let row = self.next_row()?;

        Ok(self.lifecycle.emit(row))
    }

    // Both inputs share the row type, so the target addresses either side.
    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError> {
        self.lifecycle.ensure_open("jump")?;

        for input in [&mut self.left, &mut self.right] {
            input.reset();
            input.cursor.jump(target, selector)?;
        }

        Ok(())
    }

    fn close(&mut self) -> Result<(), InternalError> {
        if self.lifecycle.close() {
            self.left.reset();
            self.right.reset();
        }

        let mut first_error = None;
        close_input(self.left.cursor.as_mut(), &mut first_error);
        close_input(self.right.cursor.as_mut(), &mut first_error);

        first_error.map_or(Ok(()), Err)
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
