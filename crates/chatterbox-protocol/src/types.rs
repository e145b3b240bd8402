//! Message types for the client/server wire format.
//!
//! Server-to-client messages are [`ToClient`], client-to-server messages
//! are [`ToServer`]. Both are internally tagged, so a message on the wire
//! looks like `{ "type": "TimeOfDay", "time": 6000, "speed": 72.0 }`.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AuthMethods
// ---------------------------------------------------------------------------

/// Bit set of authentication methods a server advertises in its greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthMethods(pub u32);

impl AuthMethods {
    /// No method advertised.
    pub const NONE: Self = Self(0);
    /// Plain-password legacy login. Never chosen by this client.
    pub const LEGACY: Self = Self(1 << 0);
    /// SRP login against an existing account.
    pub const SRP: Self = Self(1 << 1);
    /// SRP registration: the account doesn't exist yet.
    pub const FIRST_SRP: Self = Self(1 << 2);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for AuthMethods {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AuthMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05b}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

// ---------------------------------------------------------------------------
// ToClient
// ---------------------------------------------------------------------------

/// Messages the server sends to the client.
///
/// Kinds this client does not model decode to [`ToClient::Unknown`]
/// instead of failing, so new server features never break the receive
/// loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToClient {
    /// Greeting in answer to [`ToServer::Init`]. Carries the negotiated
    /// serialization version and the auth methods the server accepts.
    Hello {
        serialize_ver: u8,
        proto_ver: u16,
        auth_methods: AuthMethods,
        username: String,
    },

    /// SRP challenge: the account salt and the server's public ephemeral.
    SrpBytesSaltB { salt: Vec<u8>, b: Vec<u8> },

    /// The server accepted our proof (or registration).
    AcceptAuth {
        player_pos: Position,
        map_seed: u64,
    },

    /// The server refuses the session. Always final.
    DenyAccess { reason: String },

    TimeOfDay { time: u16, speed: f32 },

    /// The player died.
    DeathScreen { point_cam: bool },

    /// The server teleported the player.
    MovePlayer { pos: Position, pitch: f32, yaw: f32 },

    /// Breath (air) meter update.
    Breath { breath: u16 },

    Hp { hp: u16 },

    /// A chat line, formatted as `"<sender> text"`.
    ChatMessage { text: String },

    /// Any kind not listed above.
    #[serde(other)]
    Unknown,
}

/// The kind of a [`ToClient`] message, used as a dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Hello,
    SrpBytesSaltB,
    AcceptAuth,
    DenyAccess,
    TimeOfDay,
    DeathScreen,
    MovePlayer,
    Breath,
    Hp,
    ChatMessage,
    Unknown,
}

impl ToClient {
    /// Returns the message's kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Hello { .. } => MessageKind::Hello,
            Self::SrpBytesSaltB { .. } => MessageKind::SrpBytesSaltB,
            Self::AcceptAuth { .. } => MessageKind::AcceptAuth,
            Self::DenyAccess { .. } => MessageKind::DenyAccess,
            Self::TimeOfDay { .. } => MessageKind::TimeOfDay,
            Self::DeathScreen { .. } => MessageKind::DeathScreen,
            Self::MovePlayer { .. } => MessageKind::MovePlayer,
            Self::Breath { .. } => MessageKind::Breath,
            Self::Hp { .. } => MessageKind::Hp,
            Self::ChatMessage { .. } => MessageKind::ChatMessage,
            Self::Unknown => MessageKind::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// ToServer
// ---------------------------------------------------------------------------

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToServer {
    /// Initial greeting, resent until the server answers with
    /// [`ToClient::Hello`].
    Init {
        serialize_ver: u8,
        min_proto_ver: u16,
        max_proto_ver: u16,
        player_name: String,
    },

    /// SRP login: the client's public ephemeral value.
    SrpBytesA { a: Vec<u8>, no_sha1: bool },

    /// SRP registration: salt and verifier derived from the password.
    FirstSrp {
        salt: Vec<u8>,
        verifier: Vec<u8>,
        empty_password: bool,
    },

    /// SRP login: the client's proof of the shared key.
    SrpBytesM { m: Vec<u8> },

    /// Sent after authentication is accepted. Declares the client locale.
    Init2 { lang: String },

    /// Ready acknowledgement sent once the world starts ticking.
    ClientReady {
        major: u8,
        minor: u8,
        patch: u8,
        reserved: u8,
        version: String,
        formspec: u16,
    },

    /// Ask to respawn after death.
    Respawn,

    /// A chat line from this client.
    ChatMessage { msg: String },
}

impl ToServer {
    /// The initial greeting for `player_name` at this client's versions.
    pub fn greeting(player_name: &str) -> Self {
        Self::Init {
            serialize_ver: crate::SERIALIZE_VERSION,
            min_proto_ver: crate::PROTOCOL_VERSION,
            max_proto_ver: crate::PROTOCOL_VERSION,
            player_name: player_name.to_string(),
        }
    }

    /// The ready acknowledgement with this client's fixed version fields.
    pub fn client_ready() -> Self {
        let (major, minor, patch) = crate::CLIENT_VERSION;
        Self::ClientReady {
            major,
            minor,
            patch,
            reserved: 0,
            version: crate::CLIENT_VERSION_STRING.to_string(),
            formspec: crate::FORMSPEC_VERSION,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
