use crate::{
    db::cursor::CursorState,
    error::InternalError,
    obs::{MetricsEvent, OperatorKind, sink::record},
};

///
/// CursorLifecycle
///
/// State tracking and telemetry shared by every cursor implementation.
///

#[derive(Debug)]
pub(crate) struct CursorLifecycle {
    kind: OperatorKind,
    state: CursorState,
    rows_emitted: u64,
}

impl CursorLifecycle {
    pub(crate) const fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            state: CursorState::Closed,
            rows_emitted: 0,
        }
    }

    pub(crate) const fn state(&self) -> CursorState {
        self.state
    }

    pub(crate) fn open(&mut self) -> Result<(), InternalError> {
        if self.state.is_open() {
            return Err(InternalError::executor_invariant(format!(
                "{} cursor opened while already open",
                self.kind.label()
            )));
        }
        self.state = CursorState::Idle;
        self.rows_emitted = 0;
        record(MetricsEvent::CursorOpen { kind: self.kind });

        Ok(())
    }

    pub(crate) fn ensure_open(&self, operation: &str) -> Result<(), InternalError> {
        if self.state.is_open() {
            return Ok(());
        }

        Err(InternalError::executor_invariant(format!(
            "{operation} called on closed {} cursor",
            self.kind.label()
        )))
    }

    /// Record the outcome of one `next` call and pass it through.
    pub(crate) fn emit<T>(&mut self, item: Option<T>) -> Option<T> {
        if item.is_some() {
            self.state = CursorState::Active;
            self.rows_emitted = self.rows_emitted.saturating_add(1);
        } else {
            self.state = CursorState::Idle;
        }

        item
    }

    /// Returns false when the cursor was already closed.
    pub(crate) fn close(&mut self) -> bool {
        if !self.state.is_open() {
            return false;
        }
        self.state = CursorState::Closed;
        record(MetricsEvent::CursorClose {
            kind: self.kind,
            rows_emitted: self.rows_emitted,
        });

        true
    }

    pub(crate) fn storage_seek(&self) {
        record(MetricsEvent::StorageSeek { kind: self.kind });
    }

    pub(crate) fn incompatible_row(&self, message: impl Into<String>) -> InternalError {
        record(MetricsEvent::IncompatibleRow { kind: self.kind });

        InternalError::incompatible_row(message)
    }
}
