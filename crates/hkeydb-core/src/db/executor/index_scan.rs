use crate::{
    db::{
        codec::{encode_values, prefix_successor},
        cursor::{ColumnSelector, Cursor, CursorLifecycle, CursorState, ExecContext},
        data::StoredIndexEntry,
        direction::Direction,
        plan::{IndexScanPlan, compare_directed},
        row::{Row, RowType},
        store::{KeyValueStore, TreeId, owned_bound_ref, tighter_lower, tighter_upper},
    },
    error::InternalError,
    model::IndexModel,
    obs::OperatorKind,
    value::Value,
};
use std::{collections::VecDeque, ops::Bound, sync::Arc};

///
/// IndexScanCursor
///
/// Streams one index within a key range in the requested ordering.
///
/// Storage is traversed once in the first column's direction. When later
/// columns disagree, rows sharing the leading same-direction run are buffered
/// and reordered as one group; only the current group is held.
///

pub(crate) struct IndexScanCursor {
    index_type: RowType,
    index: Arc<IndexModel>,
    store: Arc<dyn KeyValueStore>,
    directions: Vec<Direction>,
    traversal: Direction,
    run_len: usize,
    selected_position: Option<usize>,

    range_lower: Bound<Vec<u8>>,
    range_upper: Bound<Vec<u8>>,
    lower: Bound<Vec<u8>>,
    upper: Bound<Vec<u8>>,

    lookahead: Option<Row>,
    group: VecDeque<Row>,
    // Rows ordered before this prefix are skipped after a jump.
    floor: Option<(Vec<Value>, usize)>,
    lifecycle: CursorLifecycle,
}

impl IndexScanCursor {
    pub(crate) fn new(plan: &IndexScanPlan, ctx: &ExecContext) -> Self {
        let width = plan.index.row_width();
        let directions = plan.ordering.expand(width);
        let traversal = directions.first().copied().unwrap_or_default();
        let run_len = directions
            .iter()
            .take_while(|direction| **direction == traversal)
            .count();
        let (range_lower, range_upper) = plan.range.envelope();

        Self {
            index_type: plan.index_type.clone(),
            index: Arc::clone(&plan.index),
            store: Arc::clone(&ctx.store),
            directions,
            traversal,
            run_len,
            selected_position: plan.selected_position,
            lower: range_lower.clone(),
            upper: range_upper.clone(),
            range_lower,
            range_upper,
            lookahead: None,
            group: VecDeque::new(),
            floor: None,
            lifecycle: CursorLifecycle::new(OperatorKind::IndexScan),
        }
    }

    const fn is_mixed(&self) -> bool {
        self.run_len < self.directions.len()
    }

    fn reset_position(&mut self) {
        self.lower = self.range_lower.clone();
        self.upper = self.range_upper.clone();
        self.lookahead = None;
        self.group.clear();
        self.floor = None;
    }

    // Next stored entry in traversal order, narrowing the envelope past it.
    fn fetch(&mut self) -> Result<Option<Row>, InternalError> {
        loop {
            self.lifecycle.storage_seek();
            let Some((key, value)) = self.store.seek(
                TreeId::Index(self.index.id),
                owned_bound_ref(&self.lower),
                owned_bound_ref(&self.upper),
                self.traversal,
            )?
            else {
                return Ok(None);
            };
            match self.traversal {
                Direction::Asc => self.lower = Bound::Excluded(key),
                Direction::Desc => self.upper = Bound::Excluded(key),
            }

            let entry = StoredIndexEntry::decode(&value)?;
            if let Some(position) = self.selected_position
                && !entry.is_present(position)
            {
                continue;
            }
            if entry.values.len() != self.index.row_width() {
                return Err(InternalError::store_corruption(format!(
                    "{} entry has {} values, expected {}",
                    self.index.name,
                    entry.values.len(),
                    self.index.row_width()
                )));
            }
            let hkey = self.index.owner_hkey(&entry.values, entry.owner_depth)?;

            return Ok(Some(Row::new(
                self.index_type.clone(),
                entry.values,
                Some(hkey),
            )));
        }
    }

    fn next_mixed(&mut self) -> Result<Option<Row>, InternalError> {
        if self.group.is_empty() {
            self.fill_group()?;
        }

        Ok(self.group.pop_front())
    }

    fn fill_group(&mut self) -> Result<(), InternalError> {
        let first = match self.lookahead.take() {
            Some(row) => row,
            None => match self.fetch()? {
                Some(row) => row,
                None => return Ok(()),
            },
        };
        self.group.push_back(first);

        while let Some(row) = self.fetch()? {
            let same_run = compare_directed(
                row.values(),
                self.group[0].values(),
                &self.directions,
                self.run_len,
            )
            .is_eq();
            if !same_run {
                self.lookahead = Some(row);
                break;
            }
            self.group.push_back(row);
        }

        let width = self.directions.len();
        self.group.make_contiguous().sort_by(|left, right| {
            compare_directed(left.values(), right.values(), &self.directions, width)
        });

        Ok(())
    }

    fn below_floor(&self, row: &Row) -> bool {
        self.floor.as_ref().is_some_and(|(target, width)| {
            compare_directed(row.values(), target, &self.directions, *width).is_lt()
        })
    }
}

impl Cursor for IndexScanCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        self.lifecycle.open()?;
        self.reset_position();

        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        self.lifecycle.ensure_open("next")?;

        let row = loop {
            let candidate = if self.is_mixed() {
                self.next_mixed()?
            } else {
                self.fetch()?
            };
            let Some(row) = candidate else {
                break None;
            };
            if self.below_floor(&row) {
                continue;
            }
            self.floor = None;
            break Some(row);
        };

        Ok(self.lifecycle.emit(row))
    }

    fn jump(&mut self, target: &Row, selector: ColumnSelector) -> Result<(), InternalError> {
        self.lifecycle.ensure_open("jump")?;

        let width = selector
            .width(target.values().len())
            .min(self.directions.len());
        let key = &target.values()[..width];
        let seek_width = if self.is_mixed() {
            width.min(self.run_len)
        } else {
            width
        };
        let encoded = encode_values(&key[..seek_width]);

        self.reset_position();
        match self.traversal {
            Direction::Asc => {
                self.lower = tighter_lower(self.range_lower.clone(), Bound::Included(encoded));
            }
            Direction::Desc => {
                self.upper = tighter_upper(
                    self.range_upper.clone(),
                    Bound::Excluded(prefix_successor(&encoded)),
                );
            }
        }
        self.floor = Some((key.to_vec(), width));

        Ok(())
    }

    fn close(&mut self) -> Result<(), InternalError> {
        if self.lifecycle.close() {
            self.lookahead = None;
            self.group.clear();
        }

        Ok(())
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
