use crate::db::codec::prefix_successor;
use std::{cmp::Ordering, ops::Bound};

///
/// envelope_is_empty
///
/// Whether raw key bounds describe an empty traversal envelope.
///

#[must_use]
pub(crate) fn envelope_is_empty<K: Ord + ?Sized>(lower: Bound<&K>, upper: Bound<&K>) -> bool {
    // Unbounded envelopes are never empty by construction.
    let (Some(lower_key), Some(upper_key)) = (bound_key(lower), bound_key(upper)) else {
        return false;
    };

    if lower_key < upper_key {
        return false;
    }
    if lower_key > upper_key {
        return true;
    }

    !matches!(lower, Bound::Included(_)) || !matches!(upper, Bound::Included(_))
}

/// Envelope of every key starting with `prefix`.
#[must_use]
pub(crate) fn prefix_envelope(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    (
        Bound::Included(prefix.to_vec()),
        Bound::Excluded(prefix_successor(prefix)),
    )
}

/// Borrow an owned byte bound as a slice bound.
#[must_use]
pub(crate) fn owned_bound_ref(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    bound.as_ref().map(Vec::as_slice)
}

/// The more restrictive of two lower bounds.
#[must_use]
pub(crate) fn tighter_lower(left: Bound<Vec<u8>>, right: Bound<Vec<u8>>) -> Bound<Vec<u8>> {
    if keeps_left(&left, &right, Ordering::Greater) {
        left
    } else {
        right
    }
}

/// The more restrictive of two upper bounds.
#[must_use]
pub(crate) fn tighter_upper(left: Bound<Vec<u8>>, right: Bound<Vec<u8>>) -> Bound<Vec<u8>> {
    if keeps_left(&left, &right, Ordering::Less) {
        left
    } else {
        right
    }
}

// `tighter` is the key ordering that makes the left bound more restrictive.
fn keeps_left(left: &Bound<Vec<u8>>, right: &Bound<Vec<u8>>, tighter: Ordering) -> bool {
    match (bound_key(left.as_ref()), bound_key(right.as_ref())) {
        (None, _) => false,
        (_, None) => true,
        (Some(l), Some(r)) => {
            let ordering = l.cmp(r);
            ordering == tighter || (ordering.is_eq() && matches!(left, Bound::Excluded(_)))
        }
    }
}

const fn bound_key<K: ?Sized>(bound: Bound<&K>) -> Option<&K> {
    match bound {
        Bound::Included(value) | Bound::Excluded(value) => Some(value),
        Bound::Unbounded => None,
    }
}
