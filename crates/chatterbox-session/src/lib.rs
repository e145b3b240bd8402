//! Client session state for Chatterbox.
//!
//! This crate handles what the client knows about its own session:
//!
//! 1. **Lifecycle** — the ordered [`ClientState`] machine and its
//!    single-writer [`Lifecycle`] holder
//! 2. **Authentication** — the [`Handshake`] that drives one of the two SRP
//!    variants against server challenges, built on the [`Srp`] capability
//!    ([`Srp6a`] is the stock implementation)
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatcher (above)  ← routes server messages into lifecycle and handshake
//!     ↕
//! Session Layer (this crate)  ← owns lifecycle state and auth context
//!     ↕
//! Protocol Layer (below)  ← provides ToClient / ToServer, AuthMethods
//! ```

mod auth;
mod error;
mod handshake;
mod srp;
mod state;

pub use auth::{Credentials, Ephemeral, Registration, Srp};
pub use error::SessionError;
pub use handshake::{AuthContext, AuthMethod, Handshake};
pub use srp::Srp6a;
pub use state::{ClientState, Lifecycle};
