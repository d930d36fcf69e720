//! Payload codec for stored rows, index entries, and primary-key map values.
//!
//! Payloads are CBOR. Key bytes never pass through here; they use the
//! order-preserving codec in `db::codec`.

mod cbor;


use crate::{
    MAX_PAYLOAD_BYTES,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error as ThisError;

///
/// SerializeError
///
/// Encoding failures are internal bugs. Decoding failures mean the stored
/// bytes are not a payload this crate wrote, so they surface as corruption.
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("payload encode failed: {0}")]
    Encode(String),

    #[error("payload decode failed: {0}")]
    Decode(String),

    #[error("payload of {len} bytes exceeds maximum of {max}")]
    TooLarge { len: usize, max: usize },
}

impl SerializeError {
    const fn class(&self) -> ErrorClass {
        match self {
            Self::Encode(_) | Self::TooLarge { .. } => ErrorClass::Internal,
            Self::Decode(_) => ErrorClass::Corruption,
        }
    }
}

impl From<SerializeError> for InternalError {
    fn from(err: SerializeError) -> Self {
        Self::new(err.class(), ErrorOrigin::Serialize, err.to_string())
    }
}

/// Encode a payload, rejecting anything over [`MAX_PAYLOAD_BYTES`].
pub fn serialize<T>(value: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    let bytes = cbor::encode(value)?;
    check_len(bytes.len())?;

    Ok(bytes)
}

/// Decode a payload produced by [`serialize`].
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    check_len(bytes.len())?;

    cbor::decode(bytes)
}

const fn check_len(len: usize) -> Result<(), SerializeError> {
    if len > MAX_PAYLOAD_BYTES {
        return Err(SerializeError::TooLarge {
            len,
            max: MAX_PAYLOAD_BYTES,
        });
    }

    Ok(())
}
