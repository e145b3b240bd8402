//! The client lifecycle state machine.

use std::fmt;

use tokio::sync::watch;

use crate::SessionError;

// ---------------------------------------------------------------------------
// ClientState
// ---------------------------------------------------------------------------

/// Where the client is in its session.
///
/// Transitions are strictly ordered, with no skipping and no going back:
///
/// ```text
/// Created → Init → Active → ChatLogging
/// ```
///
/// - **Created**: connected, greeting the server, no answer yet.
/// - **Init**: the server answered; authentication is under way.
/// - **Active**: the world is running and the client has said it's ready.
/// - **ChatLogging**: the player is in game; chat lines get replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClientState {
    Created,
    Init,
    Active,
    ChatLogging,
}

impl ClientState {
    /// The state that follows this one, or `None` at the end.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Init),
            Self::Init => Some(Self::Active),
            Self::Active => Some(Self::ChatLogging),
            Self::ChatLogging => None,
        }
    }

    /// Returns `true` if moving to `target` is legal from here.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Init => write!(f, "Init"),
            Self::Active => write!(f, "Active"),
            Self::ChatLogging => write!(f, "ChatLogging"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Sole writer of the session's [`ClientState`].
///
/// The receive loop owns the `Lifecycle` and is the only code that can
/// advance it. Background tasks get a read-only
/// [`watch::Receiver`] from [`subscribe`](Self::subscribe) and can wait
/// for the state to change without polling.
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<ClientState>,
}

impl Lifecycle {
    /// Starts a new session in [`ClientState::Created`].
    pub fn new() -> Self {
        Self {
            tx: watch::channel(ClientState::Created).0,
        }
    }

    /// The current state.
    pub fn current(&self) -> ClientState {
        *self.tx.borrow()
    }

    /// A read-only view of the state for other tasks.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.tx.subscribe()
    }

    /// Moves to `target` if it is the next state.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] otherwise; the state is
    /// left unchanged.
    pub fn advance(&mut self, target: ClientState) -> Result<(), SessionError> {
        let from = self.current();
        if !from.can_transition_to(target) {
            return Err(SessionError::InvalidTransition { from, to: target });
        }
        self.tx.send_replace(target);
        tracing::info!(%from, to = %target, "client state advanced");
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_follows_strict_order() {
        assert_eq!(ClientState::Created.next(), Some(ClientState::Init));
        assert_eq!(ClientState::Init.next(), Some(ClientState::Active));
        assert_eq!(ClientState::Active.next(), Some(ClientState::ChatLogging));
        assert_eq!(ClientState::ChatLogging.next(), None);
    }

    #[test]
    fn test_can_transition_to_rejects_skips_and_regressions() {
        assert!(!ClientState::Created.can_transition_to(ClientState::Active));
        assert!(!ClientState::Active.can_transition_to(ClientState::Init));
        assert!(!ClientState::Init.can_transition_to(ClientState::Init));
    }

    #[test]
    fn test_advance_walks_every_state_once() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.current(), ClientState::Created);

        for target in [ClientState::Init, ClientState::Active, ClientState::ChatLogging] {
            lifecycle.advance(target).expect("next state should be legal");
            assert_eq!(lifecycle.current(), target);
        }
    }

    #[test]
    fn test_advance_twice_to_same_state_fails() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(ClientState::Init).unwrap();

        let result = lifecycle.advance(ClientState::Init);

        assert!(matches!(
            result,
            Err(SessionError::InvalidTransition {
                from: ClientState::Init,
                to: ClientState::Init
            })
        ));
        assert_eq!(lifecycle.current(), ClientState::Init);
    }

    #[test]
    fn test_subscribers_see_advances() {
        let mut lifecycle = Lifecycle::new();
        let rx = lifecycle.subscribe();

        lifecycle.advance(ClientState::Init).unwrap();

        assert_eq!(*rx.borrow(), ClientState::Init);
    }

    #[test]
    fn test_display() {
        assert_eq!(ClientState::ChatLogging.to_string(), "ChatLogging");
    }
}
