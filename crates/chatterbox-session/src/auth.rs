//! The SRP capability used by the handshake.
//!
//! The handshake doesn't do any big-number arithmetic itself. It asks an
//! [`Srp`] implementation for key material at each step and only decides
//! *when* to ask and what to send. [`Srp6a`](crate::Srp6a) is the stock
//! implementation; tests plug in their own.

use std::fmt;

use crate::SessionError;

/// Account name and password the client authenticates with.
#[derive(Clone)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A client ephemeral key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ephemeral {
    /// `A`, sent to the server.
    pub public: Vec<u8>,
    /// `a`, never leaves the client.
    pub secret: Vec<u8>,
}

/// Salt and verifier for registering a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub salt: Vec<u8>,
    pub verifier: Vec<u8>,
}

/// Zero-knowledge password proof primitives (client side of SRP).
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the handshake lives inside the session
/// context, which the client moves onto its receive task.
pub trait Srp: Send + Sync + 'static {
    /// Generates a fresh ephemeral key pair.
    fn initiate(&self) -> Result<Ephemeral, SessionError>;

    /// Derives the shared key from our ephemeral pair, the credentials,
    /// and the server's challenge.
    fn complete(
        &self,
        ephemeral: &Ephemeral,
        credentials: &Credentials,
        salt: &[u8],
        server_public: &[u8],
    ) -> Result<Vec<u8>, SessionError>;

    /// Computes the proof that we hold `shared_key`.
    ///
    /// # Errors
    /// Returns [`SessionError::SafetyCheckFailed`] if the server's values
    /// are unsafe to answer.
    fn client_proof(
        &self,
        identity: &str,
        salt: &[u8],
        client_public: &[u8],
        server_public: &[u8],
        shared_key: &[u8],
    ) -> Result<Vec<u8>, SessionError>;

    /// Derives a salt and verifier for a first-time registration.
    fn new_registration(
        &self,
        credentials: &Credentials,
    ) -> Result<Registration, SessionError>;
}
