//! Error types for the session layer.

use crate::{AuthMethod, ClientState};

/// Errors that can occur while advancing the session.
///
/// None of these end the process. A handshake error aborts only the
/// current handshake step; the connection stays up until the server or a
/// timeout closes it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A handshake was started while another one is still in progress,
    /// or a challenge arrived twice.
    #[error("unexpected authentication attempt")]
    UnexpectedAuthentication,

    /// A challenge arrived for a variant other than the one negotiated.
    #[error("challenge for {expected} while authenticating with {actual}")]
    WrongAuthVariant {
        expected: AuthMethod,
        actual: AuthMethod,
    },

    /// The server speaks a different serialization version.
    #[error("serialization version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// The server's challenge failed an SRP safety check
    /// (`B mod N == 0` or `u == 0`).
    #[error("SRP safety check failed")]
    SafetyCheckFailed,

    /// The SRP capability reported an error.
    #[error("SRP failure: {0}")]
    Srp(String),

    /// The lifecycle refused a transition.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: ClientState, to: ClientState },
}
