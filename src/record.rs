//! Byte-level codec helpers for versioned records.
//!
//! Persistence itself is an external collaborator: this crate only guarantees
//! that each stateful component is representable as one versioned record
//! (`*Record` types next to each component) and that records move to and from
//! bytes losslessly. Decoding always dispatches on the version tag stored in
//! the record, never on inferred content; an unknown tag fails
//! [`UnsupportedFormatVersion`](crate::model_error::ModelWeldError::UnsupportedFormatVersion).

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model_error::ModelWeldError;

/// Encodes any serde-serializable value to a byte vector.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ModelWeldError> {
    bincode::serialize(value).map_err(|e| ModelWeldError::RecordCodec(e.to_string()))
}

/// Decodes a byte slice produced by [`encode`].
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ModelWeldError> {
    bincode::deserialize(bytes).map_err(|e| ModelWeldError::RecordCodec(e.to_string()))
}

/// Encodes a record to one contiguous byte stream for the persistence
/// collaborator.
pub fn record_to_bytes<T: Serialize>(record: &T) -> Result<Bytes, ModelWeldError> {
    encode(record).map(Bytes::from)
}

/// Decodes a byte stream produced by [`record_to_bytes`].
pub fn record_from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ModelWeldError> {
    decode(bytes)
}
