//! Wire protocol for Chatterbox.
//!
//! This crate defines what the client and the game server say to each
//! other:
//!
//! - **Types** ([`ToClient`], [`ToServer`], [`AuthMethods`], ...) — the
//!   messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! ```text
//! Transport (bytes) → Protocol (ToClient / ToServer) → Session (lifecycle, auth)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{AuthMethods, MessageKind, Position, ToClient, ToServer};

/// Serialization format version the client speaks. A server greeting
/// with any other value aborts the handshake.
pub const SERIALIZE_VERSION: u8 = 28;

/// Network protocol version, sent as both minimum and maximum.
pub const PROTOCOL_VERSION: u16 = 39;

/// Client version reported in the ready acknowledgement.
pub const CLIENT_VERSION: (u8, u8, u8) = (5, 5, 0);

/// Formspec version reported in the ready acknowledgement.
pub const FORMSPEC_VERSION: u16 = 4;

/// Free-form version string reported in the ready acknowledgement.
pub const CLIENT_VERSION_STRING: &str = "🏳‍🌈";
