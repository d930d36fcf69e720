use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState},
        plan::FilterPlan,
        row::{Row, RowType},
    },
    error::InternalError,
    obs::OperatorKind,
};

///
/// FilterCursor
///
/// Keeps rows of the listed types; forwards `jump` to its input.
///

pub(crate) struct FilterCursor {
    input: Box<dyn Cursor>,
    keep_types: Vec<RowType>,
    lifecycle: CursorLifecycle,
}

impl FilterCursor {
    pub(crate) fn new(plan: &FilterPlan, input: Box<dyn Cursor>) -> Self {
        Self {
            input,
            keep_types: plan.keep_types.clone(),
            lifecycle: CursorLifecycle::new(OperatorKind::Filter),
        }
    }
}

impl Cursor for FilterCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;

        let row = loop {
            match self.input.next()? {
                Some(row) if self.keep_types.contains(row.row_type()) => break Some(row),
                Some(_) => {}
                None => break None,
            }
        };

        Ok(self.lifecycle.emit(row))
    }

    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError> {
        self.lifecycle.ensure_open("jump")?;
        self.input.jump(target, selector)
    }

    fn close(&mut self) -> Result<(), InternalError> {
        self.lifecycle.close();
        self.input.close()
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
