use crate::{
    db::{
        codec::{encode_value, encode_value_desc},
        direction::Direction,
    },
    value::{Value, canonical_cmp},
};
use derive_more::{Deref, IntoIterator};
use std::cmp::Ordering;

///
/// IndexOrdering
///
/// Per-column directions for the leading columns of an index row.
/// Columns past the last named one inherit its direction, so an ordering
/// and its `reversed` form always produce exactly reversed streams.
///

#[derive(Clone, Debug, Deref, Eq, IntoIterator, PartialEq)]
pub struct IndexOrdering(Vec<Direction>);

impl IndexOrdering {
    #[must_use]
    pub const fn new(directions: Vec<Direction>) -> Self {
        Self(directions)
    }

    #[must_use]
    pub fn ascending(columns: usize) -> Self {
        Self(vec![Direction::Asc; columns])
    }

    #[must_use]
    pub fn descending(columns: usize) -> Self {
        Self(vec![Direction::Desc; columns])
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().map(|direction| direction.reversed()).collect())
    }

    /// Direction of column `position`, inheriting past the named prefix.
    #[must_use]
    pub fn direction_at(&self, position: usize) -> Direction {
        self.0
            .get(position)
            .or_else(|| self.0.last())
            .copied()
            .unwrap_or_default()
    }

    /// Directions for every column of a `width`-column row.
    pub(crate) fn expand(&self, width: usize) -> Vec<Direction> {
        (0..width).map(|position| self.direction_at(position)).collect()
    }
}

///
/// SortOrdering
///
/// `(column, direction)` sort keys, most significant first.
///

#[derive(Clone, Debug, Deref, Eq, IntoIterator, PartialEq)]
pub struct SortOrdering(Vec<(usize, Direction)>);

impl SortOrdering {
    #[must_use]
    pub const fn new(keys: Vec<(usize, Direction)>) -> Self {
        Self(keys)
    }

    #[must_use]
    pub fn asc(column: usize) -> Self {
        Self(vec![(column, Direction::Asc)])
    }

    #[must_use]
    pub fn desc(column: usize) -> Self {
        Self(vec![(column, Direction::Desc)])
    }

    /// Append a less significant key.
    #[must_use]
    pub fn then(mut self, column: usize, direction: Direction) -> Self {
        self.0.push((column, direction));
        self
    }

    /// Byte key whose lexicographic order is this ordering.
    pub(crate) fn encode_key(&self, values: &[Value]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len().saturating_mul(9));
        for &(column, direction) in &self.0 {
            let value = values.get(column).unwrap_or(&Value::Null);
            match direction {
                Direction::Asc => encode_value(&mut out, value),
                Direction::Desc => encode_value_desc(&mut out, value),
            }
        }

        out
    }
}

/// Compare the first `width` columns of two rows under per-column directions.
pub(crate) fn compare_directed(
    left: &[Value],
    right: &[Value],
    directions: &[Direction],
    width: usize,
) -> Ordering {
    for position in 0..width {
        let direction = directions.get(position).copied().unwrap_or_default();
        let ordering = direction.apply(canonical_cmp(
            left.get(position).unwrap_or(&Value::Null),
            right.get(position).unwrap_or(&Value::Null),
        ));
        if ordering.is_ne() {
            return ordering;
        }
    }

    Ordering::Equal
}
