//! Module: db::codec
//! Responsibility: order-preserving byte encodings for stored keys.
//! Does not own: payload serialization (see `serialize`).
//! Boundary: byte order of every encoding equals canonical value order.

mod ordered;

#[cfg(test)]
mod tests;

pub(crate) use ordered::{encode_value, encode_value_desc, encode_values, prefix_successor};
