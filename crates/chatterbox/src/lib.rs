//! # Chatterbox
//!
//! A chat bot that joins a voxel game server, authenticates over SRP, and
//! answers chat with text from a bigram Markov model.
//!
//! The layers underneath are separate crates; this one wires them into a
//! running session:
//!
//! - [`Dispatcher`] routes each server message to a handler that updates
//!   the [`SessionContext`] and returns [`Action`]s
//! - [`ChatterboxClient`] owns the receive loop and the background tasks
//!   (greeting, watchdog, shutdown, chat emitter)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chatterbox::prelude::*;
//!
//! # async fn run() -> Result<(), ChatterboxError> {
//! let client = ChatterboxClient::builder()
//!     .name("bot")
//!     .password("secret")
//!     .address("127.0.0.1:30000")
//!     .corpus("input.txt")
//!     .build(Srp6a::new())?;
//!
//! let conn = Arc::new(client.connect().await?);
//! let end = client.run(conn, std::future::pending()).await;
//! println!("{end:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod dispatcher;
mod error;

pub use client::{ChatterboxClient, ChatterboxClientBuilder, SessionEnd};
pub use config::ClientConfig;
pub use dispatcher::{Action, Dispatcher, Handler, PlayerPosition, SessionContext};
pub use error::ChatterboxError;

/// Everything needed to build and run a client.
pub mod prelude {
    pub use crate::{ChatterboxClient, ChatterboxError, ClientConfig, SessionEnd};
    pub use chatterbox_markov::MarkovModel;
    pub use chatterbox_session::{Credentials, Srp, Srp6a};
    pub use chatterbox_transport::{Connection, UdpConnection};
}
