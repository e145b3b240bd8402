//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The session layer doesn't care HOW messages become bytes; it only needs
//! something that implements [`Codec`]. [`JsonCodec`] is the default and
//! is easy to inspect in packet captures and logs.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes messages to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the codec is shared by the receive
/// loop and every task that sends on the connection.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use chatterbox_protocol::{Codec, JsonCodec, ToServer};
///
/// let codec = JsonCodec;
/// let msg = ToServer::Init2 { lang: "en_US".into() };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ToServer = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
