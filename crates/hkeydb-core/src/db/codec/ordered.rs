use crate::value::Value;

/// Byte appended to an encoded prefix to sort after every key sharing it.
///
/// Every encoded component starts with a tag or marker below this byte, so
/// `prefix ++ [0xFF]` is a strict upper bound for the prefix's key range.
const PREFIX_SUCCESSOR_BYTE: u8 = 0xFF;

const TERMINATOR: [u8; 2] = [0x00, 0x00];
const ESCAPED_ZERO: [u8; 2] = [0x00, 0xFF];

/// Encode one value so lexicographic byte order matches `canonical_cmp`.
pub(crate) fn encode_value(out: &mut Vec<u8>, value: &Value) {
    out.push(value.canonical_tag().to_u8());

    match value {
        Value::Null => {}
        Value::Bool(v) => out.push(u8::from(*v)),
        Value::Int(v) => out.extend_from_slice(&ordered_i64_bytes(*v)),
        Value::Uint(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Text(v) => push_terminated_bytes(out, v.as_bytes()),
        Value::Blob(v) => push_terminated_bytes(out, v),
    }
}

/// Encode one value so byte order is the reverse of `canonical_cmp`.
///
/// Every ascending encoding is prefix-free, so inverting each byte reverses
/// the order without a separate terminator.
pub(crate) fn encode_value_desc(out: &mut Vec<u8>, value: &Value) {
    let start = out.len();
    encode_value(out, value);

    for byte in &mut out[start..] {
        *byte = !*byte;
    }
}

/// Encode a value tuple in ascending order.
pub(crate) fn encode_values(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len().saturating_mul(9));
    for value in values {
        encode_value(&mut out, value);
    }

    out
}

/// Smallest byte string strictly greater than every key starting with `prefix`.
pub(crate) fn prefix_successor(prefix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + 1);
    out.extend_from_slice(prefix);
    out.push(PREFIX_SUCCESSOR_BYTE);

    out
}

fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == 0 {
            out.extend_from_slice(&ESCAPED_ZERO);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&TERMINATOR);
}

const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    let biased = value.cast_unsigned() ^ (1u64 << 63);
    biased.to_be_bytes()
}
