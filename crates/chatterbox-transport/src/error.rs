use crate::CloseReason;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection is closed. No further data will flow.
    #[error("connection closed: {0}")]
    Closed(CloseReason),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed. The connection may still be usable.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or dialing the remote address failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The remote address did not resolve to anything.
    #[error("could not resolve address {0}")]
    Resolve(String),
}

impl TransportError {
    /// Returns the close reason if this error means the connection is gone.
    pub fn close_reason(&self) -> Option<CloseReason> {
        match self {
            Self::Closed(reason) => Some(*reason),
            _ => None,
        }
    }
}
