//! Transport abstraction layer for Chatterbox.
//!
//! Provides the [`Connection`] trait: a single live link to the remote
//! party that can send and receive whole messages, be closed, and report
//! why it closed. Everything above this crate talks to the server only
//! through that trait.
//!
//! Connection closure is the one cancellation signal in the client. Every
//! implementation carries a [`CloseSignal`], and any task holding the
//! connection can await [`Connection::closed`] to learn when to stop.
//!
//! # Feature Flags
//!
//! - `udp` (default) — datagram transport over `tokio::net::UdpSocket`

mod error;
mod memory;
#[cfg(feature = "udp")]
mod udp;

pub use error::TransportError;
pub use memory::MemoryConnection;
#[cfg(feature = "udp")]
pub use udp::UdpConnection;

use std::fmt;
use std::future::Future;

use tokio::sync::watch;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a connection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The remote party went silent for longer than the idle timeout.
    TimedOut,
    /// Anything else: a local close, the peer going away, a dead socket.
    Other,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "timed out"),
            Self::Other => write!(f, "closed"),
        }
    }
}

/// A single connection that can send and receive whole messages.
///
/// The futures are `Send` so a connection shared through an `Arc` can be
/// driven from spawned tasks.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    ///
    /// Fails with [`TransportError::Closed`] once the connection is closed.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next message from the remote peer.
    ///
    /// Returns [`TransportError::Closed`] when the connection is gone;
    /// any other error is transient and the caller may keep receiving.
    fn recv(&self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Closes the connection. Idempotent; the first reason recorded wins.
    fn close(&self);

    /// Returns why the connection closed, or `None` while it is open.
    fn close_reason(&self) -> Option<CloseReason>;

    /// Resolves once the connection is closed.
    fn closed(&self) -> impl Future<Output = CloseReason> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// One-shot closure flag shared by a connection and everyone awaiting it.
///
/// Backed by a `watch` channel so any number of tasks can wait on
/// [`closed`](Self::closed) without holding a lock.
#[derive(Debug)]
pub struct CloseSignal {
    tx: watch::Sender<Option<CloseReason>>,
}

impl CloseSignal {
    /// Creates an open signal.
    pub fn new() -> Self {
        Self {
            tx: watch::channel(None).0,
        }
    }

    /// Marks the connection closed. Returns `false` if it already was.
    pub fn close(&self, reason: CloseReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    /// The recorded close reason, if any.
    pub fn reason(&self) -> Option<CloseReason> {
        *self.tx.borrow()
    }

    /// Resolves with the close reason once [`close`](Self::close) is called.
    pub async fn closed(&self) -> CloseReason {
        let mut rx = self.tx.subscribe();
        let reason = rx.wait_for(Option::is_some).await.ok().and_then(|r| *r);
        // The sender lives in `self`, so the wait can only end by closing.
        reason.unwrap_or(CloseReason::Other)
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}
