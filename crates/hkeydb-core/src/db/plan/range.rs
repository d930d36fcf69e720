use crate::{
    db::{
        codec::{encode_values, prefix_successor},
        cursor::ColumnSelector,
    },
    value::Value,
};
use std::ops::Bound;

///
/// IndexBound
///
/// A value prefix of an index row; the selector marks how many leading
/// values are significant.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexBound {
    values: Vec<Value>,
    selector: ColumnSelector,
}

impl IndexBound {
    #[must_use]
    pub const fn new(values: Vec<Value>, selector: ColumnSelector) -> Self {
        Self { values, selector }
    }

    /// Bound on every given value.
    #[must_use]
    pub const fn prefix(values: Vec<Value>) -> Self {
        Self::new(values, ColumnSelector::All)
    }

    /// The significant values.
    #[must_use]
    pub fn key(&self) -> &[Value] {
        &self.values[..self.selector.width(self.values.len())]
    }
}

///
/// IndexKeyRange
///
/// Optional low and high bounds, each inclusive or exclusive. Bounds compare
/// lexicographically over their own prefix width; NULL is an ordinary
/// (lowest) value.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexKeyRange {
    lo: Option<(IndexBound, bool)>,
    hi: Option<(IndexBound, bool)>,
}

impl IndexKeyRange {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { lo: None, hi: None }
    }

    #[must_use]
    pub const fn bounded(
        lo: IndexBound,
        lo_inclusive: bool,
        hi: IndexBound,
        hi_inclusive: bool,
    ) -> Self {
        Self {
            lo: Some((lo, lo_inclusive)),
            hi: Some((hi, hi_inclusive)),
        }
    }

    #[must_use]
    pub const fn starting_at(lo: IndexBound, inclusive: bool) -> Self {
        Self {
            lo: Some((lo, inclusive)),
            hi: None,
        }
    }

    #[must_use]
    pub const fn ending_at(hi: IndexBound, inclusive: bool) -> Self {
        Self {
            lo: None,
            hi: Some((hi, inclusive)),
        }
    }

    /// Widest bound prefix, for validation against the index row width.
    pub(crate) fn max_width(&self) -> usize {
        [&self.lo, &self.hi]
            .into_iter()
            .flatten()
            .map(|(bound, _)| bound.key().len())
            .max()
            .unwrap_or(0)
    }

    /// Byte envelope over ascending-encoded index rows.
    pub(crate) fn envelope(&self) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
        let lower = match &self.lo {
            None => Bound::Unbounded,
            Some((bound, true)) => Bound::Included(encode_values(bound.key())),
            Some((bound, false)) => {
                Bound::Included(prefix_successor(&encode_values(bound.key())))
            }
        };
        let upper = match &self.hi {
            None => Bound::Unbounded,
            Some((bound, true)) => Bound::Excluded(prefix_successor(&encode_values(bound.key()))),
            Some((bound, false)) => Bound::Excluded(encode_values(bound.key())),
        };

        (lower, upper)
    }
}
