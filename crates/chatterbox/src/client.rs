//! `ChatterboxClient` builder and session loop.
//!
//! This is the entry point for running a bot session. It ties together all
//! the layers: transport → protocol → session → dispatcher.
//!
//! A session is one receive loop plus a handful of background tasks:
//!
//! ```text
//! greet ──────── resends the greeting until the server answers
//! watchdog ───── closes the connection if it never does
//! shutdown ───── closes the connection on an external signal
//! emitter ────── sends a generated line on a fixed interval (after Hello)
//! receive loop ─ decodes, dispatches, and carries out actions
//! ```
//!
//! Closing the connection is the only way to stop anything. Every
//! background task waits on [`Connection::closed`] alongside its own work,
//! and the receive loop ends when `recv` reports the closure.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chatterbox_markov::MarkovModel;
use chatterbox_protocol::{Codec, JsonCodec, ToClient, ToServer};
use chatterbox_session::{ClientState, Handshake, Srp, Srp6a};
use chatterbox_transport::{CloseReason, Connection, TransportError, UdpConnection};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::dispatcher::{Action, Dispatcher, SessionContext};
use crate::{ChatterboxError, ClientConfig};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server refused us.
    Denied { reason: String },
    /// The transport gave up waiting for the server.
    TimedOut,
    /// The connection closed for any other reason, including the greeting
    /// watchdog.
    Disconnected,
    /// The shutdown signal fired.
    Interrupted,
}

/// Builder for configuring a [`ChatterboxClient`].
///
/// # Example
///
/// ```rust,ignore
/// use chatterbox::prelude::*;
///
/// let client = ChatterboxClient::builder()
///     .name("bot")
///     .password("secret")
///     .address("127.0.0.1:30000")
///     .build(Srp6a::new())?;
/// let conn = Arc::new(client.connect().await?);
/// let end = client.run(conn, shutdown_signal()).await;
/// ```
pub struct ChatterboxClientBuilder {
    config: ClientConfig,
    model: Option<MarkovModel>,
}

impl ChatterboxClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            model: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.credentials.name = name.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.credentials.password = password.into();
        self
    }

    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.config.address = addr.into();
        self
    }

    /// Sets the corpus file. Ignored if a model is supplied directly.
    pub fn corpus(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.corpus_path = path.into();
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.config.lang = lang.into();
        self
    }

    pub fn greeting_interval(mut self, every: Duration) -> Self {
        self.config.greeting_interval = every;
        self
    }

    pub fn greeting_timeout(mut self, limit: Duration) -> Self {
        self.config.greeting_timeout = limit;
        self
    }

    pub fn chat_interval(mut self, every: Duration) -> Self {
        self.config.chat_interval = every;
        self
    }

    pub fn idle_timeout(mut self, limit: Duration) -> Self {
        self.config.idle_timeout = limit;
        self
    }

    /// Uses an already trained model instead of reading the corpus file.
    pub fn model(mut self, model: MarkovModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Builds the client with the given SRP implementation and the JSON
    /// codec.
    ///
    /// # Errors
    /// Returns [`ChatterboxError::Markov`] if the corpus can't be read.
    pub fn build<S: Srp>(self, srp: S) -> Result<ChatterboxClient<S, JsonCodec>, ChatterboxError> {
        self.build_with_codec(srp, JsonCodec)
    }

    /// Builds the client with a custom codec.
    pub fn build_with_codec<S: Srp, K: Codec + Clone>(
        self,
        srp: S,
        codec: K,
    ) -> Result<ChatterboxClient<S, K>, ChatterboxError> {
        let model = match self.model {
            Some(model) => model,
            None => {
                let model = MarkovModel::from_file(&self.config.corpus_path)?;
                tracing::info!(
                    path = %self.config.corpus_path.display(),
                    words = model.len(),
                    "corpus loaded"
                );
                model
            }
        };

        Ok(ChatterboxClient {
            config: self.config,
            srp,
            codec,
            model: Arc::new(model),
        })
    }
}

impl Default for ChatterboxClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured bot, ready to run one session.
pub struct ChatterboxClient<S: Srp, K: Codec + Clone = JsonCodec> {
    config: ClientConfig,
    srp: S,
    codec: K,
    model: Arc<MarkovModel>,
}

impl ChatterboxClient<Srp6a> {
    /// Creates a new builder.
    pub fn builder() -> ChatterboxClientBuilder {
        ChatterboxClientBuilder::new()
    }
}

impl<S, K> ChatterboxClient<S, K>
where
    S: Srp,
    K: Codec + Clone,
{
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dials the configured address over UDP.
    ///
    /// # Errors
    /// Returns [`ChatterboxError::Transport`] if the address doesn't
    /// resolve or the socket can't be set up.
    pub async fn connect(&self) -> Result<UdpConnection, ChatterboxError> {
        let conn = UdpConnection::connect(&self.config.address, self.config.idle_timeout).await?;
        tracing::info!(conn_id = %conn.id(), address = %self.config.address, "connected");
        Ok(conn)
    }

    /// Runs one session on `conn` until it closes.
    ///
    /// `shutdown` resolving closes the connection and ends the session as
    /// [`SessionEnd::Interrupted`]. All background tasks have finished by
    /// the time this returns.
    pub async fn run<C, F>(self, conn: Arc<C>, shutdown: F) -> SessionEnd
    where
        C: Connection,
        F: Future<Output = ()> + Send + 'static,
    {
        let ChatterboxClient {
            config,
            srp,
            codec,
            model,
        } = self;
        let conn_id = conn.id();
        tracing::info!(%conn_id, name = %config.credentials.name, "session starting");

        let greeting = ToServer::greeting(&config.credentials.name);
        let handshake = Handshake::new(srp, config.credentials.clone(), config.lang.clone());
        let mut ctx = SessionContext::new(handshake, Arc::clone(&model));
        let interrupted = Arc::new(AtomicBool::new(false));

        let mut tasks = JoinSet::new();
        tasks.spawn(greet(
            Arc::clone(&conn),
            codec.clone(),
            ctx.subscribe(),
            greeting,
            config.greeting_interval,
        ));
        tasks.spawn(watchdog(
            Arc::clone(&conn),
            ctx.subscribe(),
            config.greeting_timeout,
        ));
        tasks.spawn(watch_shutdown(
            Arc::clone(&conn),
            shutdown,
            Arc::clone(&interrupted),
        ));

        let session = Session {
            conn: Arc::clone(&conn),
            codec,
            dispatcher: Dispatcher::new(),
            chat_interval: config.chat_interval,
            emitter_started: false,
        };
        let end = session.receive_loop(&mut ctx, &mut tasks).await;

        conn.close();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(%conn_id, error = %e, "session task failed");
            }
        }

        let end = match end {
            SessionEnd::Disconnected if interrupted.load(Ordering::SeqCst) => {
                SessionEnd::Interrupted
            }
            other => other,
        };
        tracing::info!(%conn_id, ?end, state = %ctx.state(), "session ended");
        end
    }
}

/// What the receive loop needs besides the context.
struct Session<S: Srp, C: Connection, K: Codec> {
    conn: Arc<C>,
    codec: K,
    dispatcher: Dispatcher<S>,
    chat_interval: Duration,
    emitter_started: bool,
}

impl<S, C, K> Session<S, C, K>
where
    S: Srp,
    C: Connection,
    K: Codec + Clone,
{
    /// Pulls one message at a time until the connection closes or the
    /// server denies us.
    async fn receive_loop(
        mut self,
        ctx: &mut SessionContext<S>,
        tasks: &mut JoinSet<()>,
    ) -> SessionEnd {
        loop {
            let data = match self.conn.recv().await {
                Ok(data) => data,
                Err(TransportError::Closed(CloseReason::TimedOut)) => {
                    tracing::info!(conn_id = %self.conn.id(), "connection timed out");
                    return SessionEnd::TimedOut;
                }
                Err(TransportError::Closed(CloseReason::Other)) => {
                    tracing::info!(conn_id = %self.conn.id(), "disconnected");
                    return SessionEnd::Disconnected;
                }
                Err(e) => {
                    tracing::warn!(conn_id = %self.conn.id(), error = %e, "receive failed");
                    continue;
                }
            };

            let msg: ToClient = match self.codec.decode(&data) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(error = %e, "dropping undecodable message");
                    continue;
                }
            };

            for action in self.dispatcher.dispatch(ctx, msg) {
                if let Some(end) = self.perform(action, ctx, tasks).await {
                    return end;
                }
            }
        }
    }

    /// Carries out one handler action. Returns `Some` if the session is over.
    async fn perform(
        &mut self,
        action: Action,
        ctx: &SessionContext<S>,
        tasks: &mut JoinSet<()>,
    ) -> Option<SessionEnd> {
        match action {
            Action::Send(msg) => {
                if let Err(e) = send_message(&*self.conn, &self.codec, &msg).await {
                    tracing::debug!(error = %e, "reply not sent");
                }
                None
            }
            Action::StartEmitter => {
                if !self.emitter_started {
                    self.emitter_started = true;
                    tasks.spawn(emit_chat(
                        Arc::clone(&self.conn),
                        self.codec.clone(),
                        Arc::clone(ctx.model()),
                        self.chat_interval,
                    ));
                }
                None
            }
            Action::Deny { reason } => {
                tracing::info!(conn_id = %self.conn.id(), %reason, "access denied");
                self.conn.close();
                Some(SessionEnd::Denied { reason })
            }
        }
    }
}

/// Encodes `msg` and sends it.
async fn send_message<C: Connection, K: Codec>(
    conn: &C,
    codec: &K,
    msg: &ToServer,
) -> Result<(), ChatterboxError> {
    let bytes = codec.encode(msg)?;
    conn.send(&bytes).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Resends the greeting every `every` while the state is `Created`.
async fn greet<C: Connection, K: Codec>(
    conn: Arc<C>,
    codec: K,
    mut state: watch::Receiver<ClientState>,
    greeting: ToServer,
    every: Duration,
) {
    while *state.borrow_and_update() == ClientState::Created {
        if let Err(e) = send_message(&*conn, &codec, &greeting).await {
            if e.is_closed() {
                break;
            }
            tracing::debug!(error = %e, "greeting not sent");
        }

        tokio::select! {
            biased;
            _ = conn.closed() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep(every) => {}
        }
    }
    tracing::debug!("greeting stopped");
}

/// Closes the connection if the state is still `Created` after `limit`.
async fn watchdog<C: Connection>(
    conn: Arc<C>,
    mut state: watch::Receiver<ClientState>,
    limit: Duration,
) {
    tokio::select! {
        biased;
        _ = conn.closed() => {}
        _ = left_created(&mut state) => {}
        _ = tokio::time::sleep(limit) => {
            tracing::warn!(conn_id = %conn.id(), ?limit, "server never answered the greeting");
            conn.close();
        }
    }
}

/// Resolves once the state moves past `Created`. Never resolves if the
/// state can no longer change.
async fn left_created(state: &mut watch::Receiver<ClientState>) {
    let left = state
        .wait_for(|s| *s != ClientState::Created)
        .await
        .is_ok();
    if !left {
        std::future::pending::<()>().await;
    }
}

async fn watch_shutdown<C: Connection, F: Future<Output = ()>>(
    conn: Arc<C>,
    shutdown: F,
    interrupted: Arc<AtomicBool>,
) {
    tokio::select! {
        biased;
        _ = conn.closed() => {}
        () = shutdown => {
            tracing::info!(conn_id = %conn.id(), "shutdown requested");
            interrupted.store(true, Ordering::SeqCst);
            conn.close();
        }
    }
}

/// Sends a generated line right away and then every `every`, until the
/// connection closes.
async fn emit_chat<C: Connection, K: Codec>(
    conn: Arc<C>,
    codec: K,
    model: Arc<MarkovModel>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            biased;
            _ = conn.closed() => break,
            _ = ticker.tick() => {}
        }

        let Some(line) = model.generate::<&str>(&[]) else {
            tracing::debug!("model is empty, nothing to say");
            continue;
        };
        let msg = ToServer::ChatMessage { msg: line };
        if let Err(e) = send_message(&*conn, &codec, &msg).await {
            if e.is_closed() {
                break;
            }
            tracing::debug!(error = %e, "chat line not sent");
        }
    }
    tracing::debug!("chat emitter stopped");
}
