use crate::value::Value;
use std::cmp::Ordering;

/// Total canonical comparator used by hkeys, index ordering, and sorts.
///
/// Ordering rules:
/// 1. Canonical variant tag (`Null` first)
/// 2. Variant-specific comparison for same-tagged values
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let tag = left.canonical_tag().cmp(&right.canonical_tag());
    if tag != Ordering::Equal {
        return tag;
    }

    #[allow(clippy::match_same_arms)]
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Lexicographic canonical comparison of two value slices.
/// A proper prefix sorts before its extensions.
#[must_use]
pub fn canonical_cmp_slices(left: &[Value], right: &[Value]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ordering = canonical_cmp(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}
