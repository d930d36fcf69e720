mod compare;
mod tag;


use serde::{Deserialize, Serialize};
use std::fmt;

// re-exports
pub use compare::{canonical_cmp, canonical_cmp_slices};
pub use tag::ValueTag;

///
/// Value
///
/// Dynamically typed scalar carried by rows, hkeys, and index bounds.
/// `Null` is a real value: it orders lowest and is equal only to itself
/// under `canonical_cmp`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical variant tag used by ordering and encoding surfaces.
    #[must_use]
    pub const fn canonical_tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Bool(_) => ValueTag::Bool,
            Self::Int(_) => ValueTag::Int,
            Self::Uint(_) => ValueTag::Uint,
            Self::Text(_) => ValueTag::Text,
            Self::Blob(_) => ValueTag::Blob,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}u"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Blob(v) => write!(f, "blob[{}]", v.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
