//! Metrics sink boundary.
//!
//! Cursor and store logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between execution logic
//! and the global metrics state.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// OperatorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatorKind {
    GroupScan,
    IndexScan,
    AncestorLookup,
    BranchLookup,
    Filter,
    Flatten,
    IntersectOrdered,
    UnionOrdered,
    SortTree,
    SortInsertionLimited,
}

impl OperatorKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GroupScan => "group_scan",
            Self::IndexScan => "index_scan",
            Self::AncestorLookup => "ancestor_lookup",
            Self::BranchLookup => "branch_lookup",
            Self::Filter => "filter",
            Self::Flatten => "flatten",
            Self::IntersectOrdered => "intersect_ordered",
            Self::UnionOrdered => "union_ordered",
            Self::SortTree => "sort_tree",
            Self::SortInsertionLimited => "sort_insertion_limited",
        }
    }
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    CursorOpen { kind: OperatorKind },
    CursorClose { kind: OperatorKind, rows_emitted: u64 },
    StorageSeek { kind: OperatorKind },
    SkipScanJump,
    ScratchAllocated,
    ScratchReleased,
    IncompatibleRow { kind: OperatorKind },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::CursorOpen { kind } => {
                m.ops.cursors_opened = m.ops.cursors_opened.saturating_add(1);
                let entry = metrics::operator_entry(m, kind);
                entry.opened = entry.opened.saturating_add(1);
            }

            MetricsEvent::CursorClose { kind, rows_emitted } => {
                m.ops.cursors_closed = m.ops.cursors_closed.saturating_add(1);
                m.ops.rows_emitted = m.ops.rows_emitted.saturating_add(rows_emitted);
                let entry = metrics::operator_entry(m, kind);
                entry.closed = entry.closed.saturating_add(1);
                entry.rows_emitted = entry.rows_emitted.saturating_add(rows_emitted);
            }

            MetricsEvent::StorageSeek { kind } => {
                m.ops.storage_seeks = m.ops.storage_seeks.saturating_add(1);
                let entry = metrics::operator_entry(m, kind);
                entry.storage_seeks = entry.storage_seeks.saturating_add(1);
            }

            MetricsEvent::SkipScanJump => {
                m.ops.skip_scan_jumps = m.ops.skip_scan_jumps.saturating_add(1);
            }

            MetricsEvent::ScratchAllocated => {
                m.ops.scratch_allocated = m.ops.scratch_allocated.saturating_add(1);
            }

            MetricsEvent::ScratchReleased => {
                m.ops.scratch_released = m.ops.scratch_released.saturating_add(1);
            }

            MetricsEvent::IncompatibleRow { .. } => {
                m.ops.incompatible_rows = m.ops.incompatible_rows.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for test and report plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous override is restored on every exit, including unwinding.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
