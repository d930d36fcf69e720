//! Module: db::hkey
//! Responsibility: the hierarchical key and its clustering order.
//! Does not own: table topology (see `model`) or hkey derivation for writes.
//! Boundary: `Ord` on `HKey` and the byte order of `to_bytes` always agree.


use crate::{
    MAX_HKEY_DEPTH,
    db::codec::encode_value,
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::{Value, canonical_cmp_slices},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};
use thiserror::Error as ThisError;

const SEGMENT_MARKER: u8 = 0x01;

///
/// HKeyError
///

#[derive(Debug, ThisError)]
pub enum HKeyError {
    #[error("hkey depth exceeds maximum of {max} segments")]
    DepthExceeded { max: usize },

    #[error("hkey has {available} segments, cannot take prefix of {requested}")]
    PrefixTooLong { requested: usize, available: usize },
}

impl From<HKeyError> for InternalError {
    fn from(err: HKeyError) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Executor,
            err.to_string(),
        )
    }
}

///
/// SegmentBound
///
/// Per-segment metadata: table ordinal and the end offset of the segment's
/// key values inside the flat value arena.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
struct SegmentBound {
    ordinal: u32,
    end: u32,
}

///
/// HKeySegment
///
/// Borrowed view of one `(table_ordinal, key_value)` segment.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HKeySegment<'a> {
    pub ordinal: u32,
    pub values: &'a [Value],
}

///
/// HKey
///
/// Ordered sequence of `(table_ordinal, key_value)` segments from the group
/// root down to one row's table. Stored flat: one value arena plus segment
/// bounds, never a chain of ancestor pointers.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct HKey {
    values: Vec<Value>,
    segments: Vec<SegmentBound>,
}

impl HKey {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Append one segment.
    pub fn push_segment(
        &mut self,
        ordinal: u32,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<(), HKeyError> {
        if self.segments.len() >= MAX_HKEY_DEPTH {
            return Err(HKeyError::DepthExceeded {
                max: MAX_HKEY_DEPTH,
            });
        }

        self.values.extend(values);
        let end = u32::try_from(self.values.len()).map_err(|_| HKeyError::DepthExceeded {
            max: MAX_HKEY_DEPTH,
        })?;
        self.segments.push(SegmentBound { ordinal, end });

        Ok(())
    }

    /// Builder form of [`Self::push_segment`].
    pub fn with_segment(
        mut self,
        ordinal: u32,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Self, HKeyError> {
        self.push_segment(ordinal, values)?;

        Ok(self)
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> Option<HKeySegment<'_>> {
        let bound = self.segments.get(index)?;
        let start = index
            .checked_sub(1)
            .and_then(|prev| self.segments.get(prev))
            .map_or(0, |prev| prev.end as usize);

        Some(HKeySegment {
            ordinal: bound.ordinal,
            values: &self.values[start..bound.end as usize],
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = HKeySegment<'_>> {
        (0..self.depth()).filter_map(|index| self.segment(index))
    }

    /// Ordinal of the deepest segment (the row's own table).
    #[must_use]
    pub fn last_ordinal(&self) -> Option<u32> {
        self.segments.last().map(|bound| bound.ordinal)
    }

    /// All key values of every segment, in segment order.
    #[must_use]
    pub const fn values(&self) -> &[Value] {
        self.values.as_slice()
    }

    /// The hkey of the ancestor at `depth` segments.
    pub fn prefix(&self, depth: usize) -> Result<Self, HKeyError> {
        if depth > self.depth() {
            return Err(HKeyError::PrefixTooLong {
                requested: depth,
                available: self.depth(),
            });
        }
        let end = depth
            .checked_sub(1)
            .map_or(0, |last| self.segments[last].end as usize);

        Ok(Self {
            values: self.values[..end].to_vec(),
            segments: self.segments[..depth].to_vec(),
        })
    }

    /// Number of leading segments whose key values all fall within the
    /// first `values` values of the arena.
    #[must_use]
    pub fn whole_segments_within(&self, values: usize) -> usize {
        self.segments
            .iter()
            .take_while(|bound| bound.end as usize <= values)
            .count()
    }

    /// True when `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.depth() <= other.depth() && self.segments().eq(other.segments().take(self.depth()))
    }

    /// True when `self` is a proper ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.depth() < other.depth() && self.is_prefix_of(other)
    }

    /// Order-preserving byte encoding: per segment a marker, the big-endian
    /// ordinal, then each key value's ordered encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.depth() * 5 + self.values.len() * 9);
        for segment in self.segments() {
            out.push(SEGMENT_MARKER);
            out.extend_from_slice(&segment.ordinal.to_be_bytes());
            for value in segment.values {
                encode_value(&mut out, value);
            }
        }

        out
    }
}

impl Ord for HKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (left, right) in self.segments().zip(other.segments()) {
            let ordering = left
                .ordinal
                .cmp(&right.ordinal)
                .then_with(|| canonical_cmp_slices(left.values, right.values));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        self.depth().cmp(&other.depth())
    }
}

impl PartialOrd for HKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, segment) in self.segments().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "({}", segment.ordinal)?;
            for value in segment.values {
                write!(f, ",{value}")?;
            }
            write!(f, ")")?;
        }
        write!(f, "}}")
    }
}
