//! Module: db::data
//! Responsibility: payload shapes persisted in group, index, and scratch trees.
//! Does not own: key bytes (see `codec` and `hkey`).
//! Boundary: payloads are CBOR through `serialize`; decode failure is corruption.

use crate::{
    db::hkey::HKey,
    error::InternalError,
    serialize::{deserialize, serialize},
    value::Value,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

///
/// StoredRow
///
/// One table row (or sorted row) together with its hkey.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct StoredRow {
    pub(crate) hkey: Option<HKey>,
    pub(crate) values: Vec<Value>,
}

impl StoredRow {
    pub(crate) fn encode(&self) -> Result<Vec<u8>, InternalError> {
        Ok(serialize(self)?)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, InternalError> {
        decode_payload(bytes, "row")
    }
}

///
/// StoredIndexEntry
///
/// Full index row plus the span of path positions present in it.
/// Present positions are `first_present..owner_depth`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct StoredIndexEntry {
    pub(crate) values: Vec<Value>,
    pub(crate) owner_depth: usize,
    pub(crate) first_present: usize,
}

impl StoredIndexEntry {
    pub(crate) const fn is_present(&self, path_position: usize) -> bool {
        self.first_present <= path_position && path_position < self.owner_depth
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, InternalError> {
        Ok(serialize(self)?)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, InternalError> {
        decode_payload(bytes, "index entry")
    }
}

fn decode_payload<T: DeserializeOwned>(bytes: &[u8], label: &str) -> Result<T, InternalError> {
    deserialize(bytes)
        .map_err(|err| InternalError::store_corruption(format!("undecodable {label}: {err}")))
}
