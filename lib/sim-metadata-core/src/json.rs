//! JSON bodies.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Media type of every structured body the service exchanges.
pub const APPLICATION_JSON: &str = "application/json";

/// Encode a request body.
///
/// # Example
///
/// ```
/// use sim_metadata_core::to_json;
///
/// let body = to_json(&serde_json::json!({"speedClass": "s1.fast"})).expect("encode");
/// assert_eq!(body.as_ref(), br#"{"speedClass":"s1.fast"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Decode a response body.
///
/// On failure the error names the offending field, e.g. `tags.color`.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|err| Error::decode(err.path().to_string(), err.inner().to_string()))
}
