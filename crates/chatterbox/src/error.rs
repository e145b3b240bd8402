//! Unified error type for the Chatterbox client.

use chatterbox_markov::MarkovError;
use chatterbox_protocol::ProtocolError;
use chatterbox_session::SessionError;
use chatterbox_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ChatterboxError {
    /// A transport-level error (resolve, dial, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (handshake, lifecycle).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The corpus could not be loaded.
    #[error(transparent)]
    Markov(#[from] MarkovError),
}

impl ChatterboxError {
    /// Returns `true` if the error means the connection is gone.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed(_)))
    }
}

#[cfg(test)]
mod tests {
    use chatterbox_protocol::{Codec, JsonCodec, ToClient};
    use chatterbox_transport::CloseReason;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: ChatterboxError = TransportError::Closed(CloseReason::TimedOut).into();
        assert!(matches!(err, ChatterboxError::Transport(_)));
        assert!(err.is_closed());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_from_protocol_error() {
        let decoded: Result<ToClient, ProtocolError> = JsonCodec.decode(b"{\"type\":");
        let err: ChatterboxError = decoded.unwrap_err().into();
        assert!(matches!(err, ChatterboxError::Protocol(ProtocolError::Decode(_))));
        assert!(!err.is_closed());
    }

    #[test]
    fn test_from_session_error() {
        let err: ChatterboxError = SessionError::SafetyCheckFailed.into();
        assert!(matches!(err, ChatterboxError::Session(_)));
    }

    #[test]
    fn test_from_markov_error() {
        let err: ChatterboxError = MarkovError::Io {
            path: "input.txt".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert!(matches!(err, ChatterboxError::Markov(_)));
        assert!(err.to_string().contains("input.txt"));
    }
}
