use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        direction::Direction,
        executor::close_input,
        plan::{IntersectPlan, IntersectSide, JoinType, compare_directed},
        row::{Row, RowType},
    },
    error::InternalError,
    obs::{MetricsEvent, OperatorKind, sink::record},
    value::Value,
};
use std::cmp::Ordering;

///
/// FieldComparator
///
/// Directed comparison over the leading compared fields of each side's
/// ordering columns.
///

pub(super) struct FieldComparator {
    pub(super) directions: Vec<Direction>,
    pub(super) fields: usize,
}

impl FieldComparator {
    pub(super) fn compare(&self, left: &[Value], right: &[Value]) -> Ordering {
        compare_directed(left, right, &self.directions, self.fields)
    }
}

///
/// OrderedInput
///
/// Per-side lookahead state for one ordered input of a merge.
/// Tracks the pending row, exhaustion status, and a monotonicity witness.
///

pub(super) struct OrderedInput {
    pub(super) cursor: Box<dyn Cursor>,
    row_type: RowType,
    // first ordering column; everything before it is the fixed prefix
    ordering_start: usize,
    pub(super) item: Option<Row>,
    pub(super) done: bool,
    last_fields: Option<Vec<Value>>,
    name: &'static str,
}

impl OrderedInput {
    pub(super) fn new(
        cursor: Box<dyn Cursor>,
        row_type: &RowType,
        ordering_columns: usize,
        name: &'static str,
    ) -> Self {
        Self {
            cursor,
            row_type: row_type.clone(),
            ordering_start: row_type.width().saturating_sub(ordering_columns),
            item: None,
            done: false,
            last_fields: None,
            name,
        }
    }

    pub(super) fn reset(&mut self) {
        self.item = None;
        self.done = false;
        self.last_fields = None;
    }

    pub(super) fn compared<'a>(&self, row: &'a Row, comparator: &FieldComparator) -> &'a [Value] {
        let values = row.values();
        let start = self.ordering_start.min(values.len());
        let end = start.saturating_add(comparator.fields).min(values.len());

        &values[start..end]
    }

    // Ensure one lookahead row is available for this side.
    pub(super) fn ensure_item(
        &mut self,
        comparator: &FieldComparator,
        verify_order: bool,
        lifecycle: &CursorLifecycle,
    ) -> Result<(), InternalError> {
        if self.done || self.item.is_some() {
            return Ok(());
        }

        match self.cursor.next()? {
            Some(row) => {
                if verify_order {
                    self.validate_monotonicity(&row, comparator, lifecycle)?;
                }
                self.item = Some(row);
            }
            None => self.done = true,
        }

        Ok(())
    }

    fn validate_monotonicity(
        &self,
        row: &Row,
        comparator: &FieldComparator,
        lifecycle: &CursorLifecycle,
    ) -> Result<(), InternalError> {
        if row.row_type() != &self.row_type {
            return Err(lifecycle.incompatible_row(format!(
                "{} input emitted {} row, expected {}",
                self.name,
                row.row_type(),
                self.row_type
            )));
        }
        let Some(previous) = self.last_fields.as_deref() else {
            return Ok(());
        };
        if comparator
            .compare(self.compared(row, comparator), previous)
            .is_ge()
        {
            return Ok(());
        }

        Err(lifecycle.incompatible_row(format!(
            "{} input emitted out-of-order row {row} after {previous:?}",
            self.name
        )))
    }

    pub(super) fn take_item(&mut self, comparator: &FieldComparator) -> Option<Row> {
        let row = self.item.take()?;
        self.last_fields = Some(self.compared(&row, comparator).to_vec());

        Some(row)
    }

    pub(super) fn clear_item(&mut self, comparator: &FieldComparator) {
        let _ = self.take_item(comparator);
    }

    // Jump this side to its own fixed prefix followed by `fields`.
    pub(super) fn jump_to_fields(&mut self, fields: &[Value]) -> Result<(), InternalError> {
        let Some(current) = self.item.take() else {
            return Ok(());
        };

        let width = self.row_type.width();
        let mut values = Vec::with_capacity(width);
        values.extend_from_slice(&current.values()[..self.ordering_start]);
        values.extend_from_slice(fields);
        let selected = values.len();
        values.resize(width, Value::Null);

        let target = Row::new(self.row_type.clone(), values, None);
        record(MetricsEvent::SkipScanJump);

        self.cursor.jump(&target, ColumnSelector::Prefix(selected))
    }
}

///
/// IntersectCursor
///
/// Merge intersection of two inputs ordered on shared comparison fields.
/// Emits rows of one side; optionally keeps that side's unmatched rows.
///

pub(crate) struct IntersectCursor {
    left: OrderedInput,
    right: OrderedInput,
    comparator: FieldComparator,
    output: IntersectSide,
    keep_unmatched: bool,
    skip_scan: bool,
    verify_order: bool,
    lifecycle: CursorLifecycle,
}

impl IntersectCursor {
    pub(crate) fn new(
        plan: &IntersectPlan,
        left: Box<dyn Cursor>,
        right: Box<dyn Cursor>,
        ctx: &ExecContext,
    ) -> Self {
        let keep_unmatched = matches!(plan.join_type, JoinType::Left | JoinType::Right);

        Self {
            left: OrderedInput::new(
                left,
                &plan.left_type,
                plan.left_ordering_columns,
                "intersect left",
            ),
            right: OrderedInput::new(
                right,
                &plan.right_type,
                plan.right_ordering_columns,
                "intersect right",
            ),
            comparator: FieldComparator {
                directions: plan.directions.clone(),
                fields: plan.comparison_fields,
            },
            output: plan.output,
            keep_unmatched,
            skip_scan: plan.skip_scan,
            verify_order: ctx.config.verify_input_order,
            lifecycle: CursorLifecycle::new(OperatorKind::IntersectOrdered),
        }
    }

    const fn side(&self, side: IntersectSide) -> &OrderedInput {
        match side {
            IntersectSide::Left => &self.left,
            IntersectSide::Right => &self.right,
        }
    }

    // One side borrowed mutably next to the shared comparator.
    const fn split(&mut self, side: IntersectSide) -> (&mut OrderedInput, &FieldComparator) {
        match side {
            IntersectSide::Left => (&mut self.left, &self.comparator),
            IntersectSide::Right => (&mut self.right, &self.comparator),
        }
    }

    fn take_item(&mut self, side: IntersectSide) -> Option<Row> {
        let (input, comparator) = self.split(side);
        input.take_item(comparator)
    }

    fn ensure_items(&mut self) -> Result<(), InternalError> {
        self.left
            .ensure_item(&self.comparator, self.verify_order, &self.lifecycle)?;
        self.right
            .ensure_item(&self.comparator, self.verify_order, &self.lifecycle)
    }

    // Order of the left lookahead against the right, in stream order.
    fn compare_items(&self) -> Option<Ordering> {
        let left = self.left.item.as_ref()?;
        let right = self.right.item.as_ref()?;

        Some(self.comparator.compare(
            self.left.compared(left, &self.comparator),
            self.right.compared(right, &self.comparator),
        ))
    }

    // Move the behind side up to the ahead side's fields.
    fn advance_behind(&mut self, behind: IntersectSide) -> Result<(), InternalError> {
        if !self.skip_scan {
            let (input, comparator) = self.split(behind);
            input.clear_item(comparator);
            return Ok(());
        }

        let ahead = self.side(behind.other());
        let Some(ahead_row) = ahead.item.as_ref() else {
            return Ok(());
        };
        let fields = ahead.compared(ahead_row, &self.comparator).to_vec();

        self.split(behind).0.jump_to_fields(&fields)
    }

    fn next_row(&mut self) -> Result<Option<Row>, InternalError> {
        let output = self.output;

        loop {
            self.ensure_items()?;

            if self.side(output).done {
                return Ok(None);
            }
            if self.side(output.other()).done {
                if !self.keep_unmatched {
                    return Ok(None);
                }
                return Ok(self.take_item(output));
            }

            let Some(ordering) = self.compare_items() else {
                return Ok(None);
            };
            let behind = match ordering {
                Ordering::Equal => return Ok(self.take_item(output)),
                Ordering::Less => IntersectSide::Left,
                Ordering::Greater => IntersectSide::Right,
            };

            if behind == output && self.keep_unmatched {
                return Ok(self.take_item(output));
            }
            self.advance_behind(behind)?;
        }
    }
}

impl Cursor for IntersectCursor {
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

    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError> {
        self.lifecycle.ensure_open("jump")?;

        let output = self.output;
        let target_fields = {
            let input = self.side(output);
            let end = input.ordering_start + self.comparator.fields;
            (selector.width(target.values().len()) >= end)
                .then(|| input.compared(target, &self.comparator).to_vec())
        };

        let input = self.split(output).0;
        input.reset();
        input.cursor.jump(target, selector)?;

        // The other side only moves forward, and only when it is behind.
        let Some(fields) = target_fields else {
            return Ok(());
        };
        let other = self.side(output.other());
        let behind = other.item.as_ref().is_some_and(|row| {
            self.comparator
                .compare(other.compared(row, &self.comparator), &fields)
                .is_lt()
        });
        if behind {
            self.split(output.other()).0.jump_to_fields(&fields)?;
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
