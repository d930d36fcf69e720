//! Module: db::cursor
//! Responsibility: the pull-based cursor contract shared by every operator.
//! Does not own: operator semantics (see `executor`) or plan validation.
//! Boundary: operators compose only through `Box<dyn Cursor>`.

mod lifecycle;


use crate::{
    config::ExecConfig,
    db::{row::Row, store::KeyValueStore},
    error::InternalError,
};
use std::sync::Arc;

// re-exports
pub(crate) use lifecycle::CursorLifecycle;

///
/// CursorState
///
/// `Closed → open → Idle → next (row) → Active → next (end) → Idle → close → Closed`
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CursorState {
    #[default]
    Closed,
    Idle,
    Active,
}

impl CursorState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

///
/// ColumnSelector
///
/// Which leading positions of a target row are significant for `jump`.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ColumnSelector {
    #[default]
    All,
    Prefix(usize),
}

impl ColumnSelector {
    #[must_use]
    pub const fn prefix(width: usize) -> Self {
        Self::Prefix(width)
    }

    /// Number of significant positions in a row of `row_width` columns.
    #[must_use]
    pub fn width(self, row_width: usize) -> usize {
        match self {
            Self::All => row_width,
            Self::Prefix(width) => width.min(row_width),
        }
    }
}

///
/// Cursor
///
/// Pull-based row stream. `close` is idempotent and closes every input.
///

pub trait Cursor {
    /// Start (or restart) iteration. Fails if the cursor is already open.
    fn open(&mut self) -> Result<(), InternalError>;

    /// Next row in this operator's order; `None` at (and after) end of stream.
    fn next(&mut self) -> Result<Option<Row>, InternalError>;

    /// Reposition an open cursor at or after the selected prefix of `target`.
    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError>;

    fn close(&mut self) -> Result<(), InternalError>;

    fn state(&self) -> CursorState;
}

impl<T> Cursor for Box<T>
where
    T: Cursor + ?Sized,
{
    fn open(&mut self) -> Result<(), InternalError> {
        self.as_mut().open()
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.as_mut().next()
    }

    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError> {
        self.as_mut().jump(target, selector)
    }

    fn close(&mut self) -> Result<(), InternalError> {
        self.as_mut().close()
    }

    fn state(&self) -> CursorState {
        self.as_ref().state()
    }
}

///
/// ExecContext
///
/// Store handle and configuration bound into every cursor of one plan.
///

#[derive(Clone)]
pub struct ExecContext {
    pub store: Arc<dyn KeyValueStore>,
    pub config: Arc<ExecConfig>,
}

impl ExecContext {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: Arc<ExecConfig>) -> Self {
        Self { store, config }
    }
}

/// Open `cursor`, drain it, and close it.
pub fn drain(cursor: &mut dyn Cursor) -> Result<Vec<Row>, InternalError> {
    cursor.open()?;
    let mut rows = Vec::new();
    let result = loop {
        match cursor.next() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    cursor.close()?;
    result?;

    Ok(rows)
}
