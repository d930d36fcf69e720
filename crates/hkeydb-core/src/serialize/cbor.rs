use crate::serialize::SerializeError;
use serde::{Serialize, de::DeserializeOwned};
use std::panic::{AssertUnwindSafe, catch_unwind};

pub(super) fn encode<T>(value: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    serde_cbor::to_vec(value).map_err(|err| SerializeError::Encode(err.to_string()))
}

// serde_cbor can panic on some malformed inputs; those decode as errors too.
pub(super) fn decode<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    match catch_unwind(AssertUnwindSafe(|| serde_cbor::from_slice(bytes))) {
        Ok(decoded) => decoded.map_err(|err| SerializeError::Decode(err.to_string())),
        Err(_) => Err(SerializeError::Decode("decoder panicked".into())),
    }
}
