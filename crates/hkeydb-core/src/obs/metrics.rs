use crate::obs::sink::OperatorKind;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for cursor and storage activity.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub operators: BTreeMap<String, OperatorCounters>,
}

/// Point-in-time copy of the metrics state.
pub type EventReport = EventState;

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Cursor lifecycle
    pub cursors_opened: u64,
    pub cursors_closed: u64,
    pub rows_emitted: u64,

    // Storage
    pub storage_seeks: u64,
    pub skip_scan_jumps: u64,
    pub scratch_allocated: u64,
    pub scratch_released: u64,

    // Consistency
    pub incompatible_rows: u64,
}

///
/// OperatorCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperatorCounters {
    pub opened: u64,
    pub closed: u64,
    pub rows_emitted: u64,
    pub storage_seeks: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Borrow (creating if needed) the counters of one operator kind.
pub(crate) fn operator_entry(state: &mut EventState, kind: OperatorKind) -> &mut OperatorCounters {
    state.operators.entry(kind.label().to_string()).or_default()
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Snapshot the current state.
pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}
