//! Datagram transport over a connected `tokio::net::UdpSocket`.
//!
//! One datagram carries one message. Retransmission and fragmentation are
//! left to the server's reliability layer; this transport only frames,
//! tracks idleness, and reports closure.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::{CloseReason, CloseSignal, Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Largest payload a single UDP datagram can carry.
const MAX_DATAGRAM: usize = 65_507;

/// A [`Connection`] to one remote UDP endpoint.
///
/// The connection times out when nothing has been received for
/// `idle_timeout`; the next `recv` then fails with
/// [`CloseReason::TimedOut`].
pub struct UdpConnection {
    id: ConnectionId,
    socket: UdpSocket,
    idle_timeout: Duration,
    last_received: Mutex<Instant>,
    signal: CloseSignal,
}

impl UdpConnection {
    /// Resolves `addr`, binds an ephemeral local port, and connects to it.
    pub async fn connect(
        addr: &str,
        idle_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let remote = tokio::net::lookup_host(addr)
            .await
            .map_err(|_| TransportError::Resolve(addr.to_string()))?
            .next()
            .ok_or_else(|| TransportError::Resolve(addr.to_string()))?;

        let local = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(TransportError::ConnectFailed)?;
        socket
            .connect(remote)
            .await
            .map_err(TransportError::ConnectFailed)?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %remote, "UDP connection established");

        Ok(Self {
            id,
            socket,
            idle_timeout,
            last_received: Mutex::new(Instant::now()),
            signal: CloseSignal::new(),
        })
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    fn idle_deadline(&self) -> Instant {
        let last = *self
            .last_received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        last + self.idle_timeout
    }

    fn touch(&self) {
        *self
            .last_received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }
}

impl Connection for UdpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if let Some(reason) = self.signal.reason() {
            return Err(TransportError::Closed(reason));
        }
        self.socket
            .send(data)
            .await
            .map(|_| ())
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        if let Some(reason) = self.signal.reason() {
            return Err(TransportError::Closed(reason));
        }

        let deadline = self.idle_deadline();
        let mut buf = vec![0u8; MAX_DATAGRAM];

        tokio::select! {
            reason = self.signal.closed() => Err(TransportError::Closed(reason)),
            result = tokio::time::timeout_at(deadline, self.socket.recv(&mut buf)) => {
                match result {
                    Ok(Ok(len)) => {
                        self.touch();
                        buf.truncate(len);
                        Ok(buf)
                    }
                    Ok(Err(e)) => Err(TransportError::ReceiveFailed(e)),
                    Err(_) => {
                        if self.signal.close(CloseReason::TimedOut) {
                            tracing::debug!(id = %self.id, "UDP connection idle timeout");
                        }
                        let reason = self.signal.reason().unwrap_or(CloseReason::TimedOut);
                        Err(TransportError::Closed(reason))
                    }
                }
            }
        }
    }

    fn close(&self) {
        if self.signal.close(CloseReason::Other) {
            tracing::debug!(id = %self.id, "UDP connection closed");
        }
    }

    fn close_reason(&self) -> Option<CloseReason> {
        self.signal.reason()
    }

    async fn closed(&self) -> CloseReason {
        self.signal.closed().await
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
