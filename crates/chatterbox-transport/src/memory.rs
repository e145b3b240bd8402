//! In-process connection pair.
//!
//! Two [`MemoryConnection`]s wired back to back through unbounded channels.
//! Used to drive the client against a scripted server in tests and
//! simulations without touching the network.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::{CloseReason, CloseSignal, Connection, ConnectionId, TransportError};

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(1);

/// One end of an in-memory connection.
///
/// Dropping one end makes the other end's `recv` fail with
/// [`CloseReason::Other`] once the queued messages are drained.
pub struct MemoryConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    signal: CloseSignal,
}

impl MemoryConnection {
    /// Creates two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(
        outbound: mpsc::UnboundedSender<Vec<u8>>,
        inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            id: ConnectionId::new(NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed)),
            outbound,
            inbound: Mutex::new(inbound),
            signal: CloseSignal::new(),
        }
    }

    /// Closes this end with an explicit reason, e.g. to simulate a
    /// transport timeout.
    pub fn close_with(&self, reason: CloseReason) {
        self.signal.close(reason);
    }

    /// Takes the next queued message without waiting.
    ///
    /// Returns `None` if nothing is queued or a `recv` is in progress.
    pub fn try_recv(&self) -> Option<Vec<u8>> {
        self.inbound.try_lock().ok()?.try_recv().ok()
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if let Some(reason) = self.signal.reason() {
            return Err(TransportError::Closed(reason));
        }
        self.outbound
            .send(data.to_vec())
            .map_err(|_| TransportError::Closed(CloseReason::Other))
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        if let Some(reason) = self.signal.reason() {
            return Err(TransportError::Closed(reason));
        }

        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            reason = self.signal.closed() => Err(TransportError::Closed(reason)),
            msg = inbound.recv() => match msg {
                Some(data) => Ok(data),
                None => {
                    self.signal.close(CloseReason::Other);
                    Err(TransportError::Closed(CloseReason::Other))
                }
            },
        }
    }

    fn close(&self) {
        self.signal.close(CloseReason::Other);
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
