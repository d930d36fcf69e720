use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        data::StoredRow,
        direction::Direction,
        executor::unsupported_jump,
        plan::{DuplicatePolicy, SortOrdering, SortPlan},
        row::{Row, RowType},
        store::{KeyValueStore, ScratchTree, owned_bound_ref},
    },
    error::InternalError,
    obs::OperatorKind,
};
use std::{
    collections::{BTreeMap, VecDeque},
    ops::Bound,
    sync::Arc,
};

// Sort input must be homogeneous; rows are rebuilt under the plan's type.
fn check_row_type(
    lifecycle: &CursorLifecycle,
    row_type: &RowType,
    row: &Row,
) -> Result<(), InternalError> {
    if row.row_type() == row_type {
        return Ok(());
    }

    Err(lifecycle.incompatible_row(format!(
        "sort over {row_type} received {} row {row}",
        row.row_type()
    )))
}

///
/// SortTreeCursor
///
/// Full sort through an operator-private scratch tree.
///
/// `open` allocates the tree and drains the input into it, keyed by the
/// encoded sort key (plus an input sequence number when ties are preserved).
/// `next` streams the tree in key order; `close` releases it.
///

pub(crate) struct SortTreeCursor {
    input: Box<dyn Cursor>,
    store: Arc<dyn KeyValueStore>,
    row_type: RowType,
    ordering: SortOrdering,
    policy: DuplicatePolicy,
    scratch: Option<ScratchTree>,
    lower: Bound<Vec<u8>>,
    lifecycle: CursorLifecycle,
}

impl SortTreeCursor {
    pub(crate) fn new(plan: &SortPlan, input: Box<dyn Cursor>, ctx: &ExecContext) -> Self {
        Self {
            input,
            store: Arc::clone(&ctx.store),
            row_type: plan.row_type.clone(),
            ordering: plan.ordering.clone(),
            policy: plan.policy,
            scratch: None,
            lower: Bound::Unbounded,
            lifecycle: CursorLifecycle::new(OperatorKind::SortTree),
        }
    }

    fn load(&mut self, scratch: &ScratchTree) -> Result<(), InternalError> {
        let tree = scratch.tree();
        let mut sequence = 0u64;

        while let Some(row) = self.input.next()? {
            check_row_type(&self.lifecycle, &self.row_type, &row)?;

            let mut key = self.ordering.encode_key(row.values());
            match self.policy {
                DuplicatePolicy::Preserve => {
                    key.extend_from_slice(&sequence.to_be_bytes());
                    sequence += 1;
                }
                DuplicatePolicy::Suppress => {
                    if self.store.get(tree, &key)?.is_some() {
                        continue;
                    }
                }
            }

            let stored = StoredRow {
                hkey: row.hkey().cloned(),
                values: row.into_values(),
            };
            self.store.put(tree, key, stored.encode()?)?;
        }

        Ok(())
    }

    fn release_scratch(&mut self) -> Result<(), InternalError> {
        self.scratch.take().map_or(Ok(()), ScratchTree::release)
    }
}

impl Cursor for SortTreeCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.release_scratch()?;
        self.lower = Bound::Unbounded;

        let scratch = ScratchTree::allocate(&self.store)?;
        self.input.open()?;
        let loaded = self.load(&scratch);
        let closed = self.input.close();
        loaded?;
        closed?;
        self.scratch = Some(scratch);

        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;
        let Some(scratch) = self.scratch.as_ref() else {
            return Err(InternalError::executor_invariant(
                "sort tree cursor open without scratch tree",
            ));
        };

        self.lifecycle.storage_seek();
        let entry = self.store.seek(
            scratch.tree(),
            owned_bound_ref(&self.lower),
            Bound::Unbounded,
            Direction::Asc,
        )?;
        let row = match entry {
            Some((key, value)) => {
                let stored = StoredRow::decode(&value)?;
                self.lower = Bound::Excluded(key);
                Some(Row::new(self.row_type.clone(), stored.values, stored.hkey))
            }
            None => None,
        };

        Ok(self.lifecycle.emit(row))
    }

    fn jump(&mut self, _target: &Row, _selector: ColumnSelector) -> Result<(), InternalError> {
        unsupported_jump(&self.lifecycle, "sort")
    }

    fn close(&mut self) -> Result<(), InternalError> {
        self.lifecycle.close();
        let released = self.release_scratch();
        let closed = self.input.close();
        released?;

        closed
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}

///
/// SortInsertionLimitedCursor
///
/// In-memory top-K sort holding at most `limit` rows.
///

pub(crate) struct SortInsertionLimitedCursor {
    input: Box<dyn Cursor>,
    row_type: RowType,
    ordering: SortOrdering,
    policy: DuplicatePolicy,
    limit: usize,
    sorted: VecDeque<Row>,
    lifecycle: CursorLifecycle,
}

impl SortInsertionLimitedCursor {
    pub(crate) fn new(plan: &SortPlan, input: Box<dyn Cursor>) -> Self {
        Self {
            input,
            row_type: plan.row_type.clone(),
            ordering: plan.ordering.clone(),
            policy: plan.policy,
            limit: plan.limit,
            sorted: VecDeque::new(),
            lifecycle: CursorLifecycle::new(OperatorKind::SortInsertionLimited),
        }
    }

    fn load(&mut self) -> Result<VecDeque<Row>, InternalError> {
        let mut kept: BTreeMap<(Vec<u8>, u64), Row> = BTreeMap::new();
        if self.limit == 0 {
            return Ok(VecDeque::new());
        }

        let mut sequence = 0u64;
        while let Some(row) = self.input.next()? {
            check_row_type(&self.lifecycle, &self.row_type, &row)?;

            let sort_key = self.ordering.encode_key(row.values());
            let key = match self.policy {
                DuplicatePolicy::Preserve => {
                    sequence += 1;
                    (sort_key, sequence)
                }
                DuplicatePolicy::Suppress => (sort_key, 0),
            };
            if kept.contains_key(&key) {
                continue;
            }

            kept.insert(key, row);
            if kept.len() > self.limit {
                kept.pop_last();
            }
        }

        Ok(kept.into_values().collect())
    }
}

impl Cursor for SortInsertionLimitedCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.sorted.clear();

        self.input.open()?;
        let loaded = self.load();
        let closed = self.input.close();
        self.sorted = loaded?;
        closed
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;
        let row = self.sorted.pop_front();

        Ok(self.lifecycle.emit(row))
    }

    fn jump(&mut self, _target: &Row, _selector: ColumnSelector) -> Result<(), InternalError> {
        unsupported_jump(&self.lifecycle, "sort")
    }

    fn close(&mut self) -> Result<(), InternalError> {
        if self.lifecycle.close() {
            self.sorted.clear();
        }

        self.input.close()
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
