//! Message routing: one handler per server message kind.
//!
//! Handlers are plain functions that take the session context and the
//! message, mutate the context, and return the [`Action`]s the caller
//! should carry out. They never touch the network themselves, which keeps
//! them synchronous and lets tests inspect exactly what a message caused.
//!
//! New kinds are supported by registering another handler; kinds with no
//! handler are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use chatterbox_markov::MarkovModel;
use chatterbox_protocol::{MessageKind, Position, ToClient, ToServer};
use chatterbox_session::{AuthContext, ClientState, Handshake, Lifecycle, Srp};
use tokio::sync::watch;

/// A side effect requested by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a message to the server.
    Send(ToServer),
    /// Start the periodic chat emitter.
    StartEmitter,
    /// The server refused us; end the session.
    Deny { reason: String },
}

/// Where the server last put the player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerPosition {
    pub pos: Position,
    pub pitch: f32,
    pub yaw: f32,
}

/// Everything a session knows, owned by the receive loop.
///
/// Other tasks only see the lifecycle state, through
/// [`subscribe`](Self::subscribe).
pub struct SessionContext<S: Srp> {
    lifecycle: Lifecycle,
    handshake: Handshake<S>,
    position: PlayerPosition,
    model: Arc<MarkovModel>,
}

impl<S: Srp> SessionContext<S> {
    pub fn new(handshake: Handshake<S>, model: Arc<MarkovModel>) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            handshake,
            position: PlayerPosition::default(),
            model,
        }
    }

    pub fn state(&self) -> ClientState {
        self.lifecycle.current()
    }

    /// A read-only view of the lifecycle state for background tasks.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.lifecycle.subscribe()
    }

    pub fn auth(&self) -> &AuthContext {
        self.handshake.context()
    }

    pub fn position(&self) -> PlayerPosition {
        self.position
    }

    pub fn model(&self) -> &Arc<MarkovModel> {
        &self.model
    }

    /// The tag that prefixes our own chat lines, e.g. `<bot>`.
    fn own_tag(&self) -> String {
        format!("<{}>", self.handshake.credentials().name)
    }
}

/// A message handler.
pub type Handler<S> = fn(&mut SessionContext<S>, ToClient) -> Vec<Action>;

/// Maps message kinds to handlers.
pub struct Dispatcher<S: Srp> {
    handlers: HashMap<MessageKind, Handler<S>>,
}

impl<S: Srp> Dispatcher<S> {
    /// A dispatcher with no handlers: every message is ignored.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A dispatcher with the client's standard handlers registered.
    pub fn new() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher
            .register(MessageKind::Hello, on_hello)
            .register(MessageKind::SrpBytesSaltB, on_srp_challenge)
            .register(MessageKind::AcceptAuth, on_accept_auth)
            .register(MessageKind::DenyAccess, on_deny_access)
            .register(MessageKind::TimeOfDay, on_time_of_day)
            .register(MessageKind::DeathScreen, on_death_screen)
            .register(MessageKind::MovePlayer, on_move_player)
            .register(MessageKind::Breath, on_breath)
            .register(MessageKind::ChatMessage, on_chat_message);
        dispatcher
    }

    /// Sets the handler for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: MessageKind, handler: Handler<S>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Runs the handler for `msg`'s kind, if any.
    pub fn dispatch(&self, ctx: &mut SessionContext<S>, msg: ToClient) -> Vec<Action> {
        let kind = msg.kind();
        match self.handlers.get(&kind) {
            Some(handler) => {
                tracing::trace!(?kind, "dispatching message");
                handler(ctx, msg)
            }
            None => {
                tracing::trace!(?kind, "no handler, ignoring message");
                Vec::new()
            }
        }
    }
}

impl<S: Srp> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Created → Init. Starts the emitter and the handshake.
fn on_hello<S: Srp>(ctx: &mut SessionContext<S>, msg: ToClient) -> Vec<Action> {
    let ToClient::Hello {
        serialize_ver,
        auth_methods,
        ..
    } = msg
    else {
        return Vec::new();
    };

    if let Err(e) = ctx.lifecycle.advance(ClientState::Init) {
        tracing::warn!(error = %e, "ignoring repeated server greeting");
        return Vec::new();
    }

    let mut actions = vec![Action::StartEmitter];
    match ctx.handshake.begin(auth_methods, serialize_ver) {
        Ok(first) => actions.push(Action::Send(first)),
        Err(e) => tracing::warn!(error = %e, "handshake aborted"),
    }
    actions
}

fn on_srp_challenge<S: Srp>(ctx: &mut SessionContext<S>, msg: ToClient) -> Vec<Action> {
    let ToClient::SrpBytesSaltB { salt, b } = msg else {
        return Vec::new();
    };

    match ctx.handshake.respond(&salt, &b) {
        Ok(proof) => vec![Action::Send(proof)],
        Err(e) => {
            tracing::warn!(error = %e, "ignoring SRP challenge");
            Vec::new()
        }
    }
}

fn on_accept_auth<S: Srp>(ctx: &mut SessionContext<S>, _msg: ToClient) -> Vec<Action> {
    vec![Action::Send(ctx.handshake.accept())]
}

fn on_deny_access<S: Srp>(_ctx: &mut SessionContext<S>, msg: ToClient) -> Vec<Action> {
    let ToClient::DenyAccess { reason } = msg else {
        return Vec::new();
    };
    vec![Action::Deny { reason }]
}

/// Init → Active. Later time updates are routine and ignored.
fn on_time_of_day<S: Srp>(ctx: &mut SessionContext<S>, _msg: ToClient) -> Vec<Action> {
    if ctx.state() != ClientState::Init {
        return Vec::new();
    }
    match ctx.lifecycle.advance(ClientState::Active) {
        Ok(()) => vec![Action::Send(ToServer::client_ready())],
        Err(e) => {
            tracing::warn!(error = %e, "cannot become active");
            Vec::new()
        }
    }
}

fn on_death_screen<S: Srp>(_ctx: &mut SessionContext<S>, _msg: ToClient) -> Vec<Action> {
    tracing::debug!("player died, requesting respawn");
    vec![Action::Send(ToServer::Respawn)]
}

fn on_move_player<S: Srp>(ctx: &mut SessionContext<S>, msg: ToClient) -> Vec<Action> {
    if let ToClient::MovePlayer { pos, pitch, yaw } = msg {
        ctx.position = PlayerPosition { pos, pitch, yaw };
    }
    Vec::new()
}

/// Active → ChatLogging. Fires once; later breath updates are ignored.
fn on_breath<S: Srp>(ctx: &mut SessionContext<S>, _msg: ToClient) -> Vec<Action> {
    if ctx.state() != ClientState::Active {
        return Vec::new();
    }
    if ctx.lifecycle.advance(ClientState::ChatLogging).is_ok() {
        tracing::info!("logging chat messages");
    }
    Vec::new()
}

/// Replies to other players' chat with generated text seeded by their words.
fn on_chat_message<S: Srp>(ctx: &mut SessionContext<S>, msg: ToClient) -> Vec<Action> {
    let ToClient::ChatMessage { text } = msg else {
        return Vec::new();
    };
    if ctx.state() != ClientState::ChatLogging || text.starts_with(&ctx.own_tag()) {
        return Vec::new();
    }

    // The first word is the sender tag.
    let seeds: Vec<&str> = text.split_whitespace().skip(1).collect();
    match ctx.model.generate(&seeds) {
        Some(reply) => vec![Action::Send(ToServer::ChatMessage { msg: reply })],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use chatterbox_protocol::{AuthMethods, SERIALIZE_VERSION};
    use chatterbox_session::{
        AuthMethod, Credentials, Ephemeral, Registration, SessionError,
    };

    use super::*;

    /// SRP stand-in with fixed outputs.
    struct FixedSrp;

    impl Srp for FixedSrp {
        fn initiate(&self) -> Result<Ephemeral, SessionError> {
            Ok(Ephemeral {
                public: vec![0xA],
                secret: vec![0x1],
            })
        }

        fn complete(
            &self,
            _ephemeral: &Ephemeral,
            _credentials: &Credentials,
            _salt: &[u8],
            _server_public: &[u8],
        ) -> Result<Vec<u8>, SessionError> {
            Ok(vec![0xC0])
        }

        fn client_proof(
            &self,
            _identity: &str,
            _salt: &[u8],
            _client_public: &[u8],
            _server_public: &[u8],
            _shared_key: &[u8],
        ) -> Result<Vec<u8>, SessionError> {
            Ok(vec![0xF0])
        }

        fn new_registration(
            &self,
            _credentials: &Credentials,
        ) -> Result<Registration, SessionError> {
            Ok(Registration {
                salt: vec![0x5],
                verifier: vec![0x7],
            })
        }
    }

    const CORPUS: &str = "the cat sat. the dog ran.";

    fn context() -> SessionContext<FixedSrp> {
        let handshake = Handshake::new(FixedSrp, Credentials::new("bot", "pw"), "en_US");
        SessionContext::new(handshake, Arc::new(MarkovModel::train(CORPUS)))
    }

    fn hello(methods: AuthMethods, serialize_ver: u8) -> ToClient {
        ToClient::Hello {
            serialize_ver,
            proto_ver: 39,
            auth_methods: methods,
            username: "bot".into(),
        }
    }

    fn time_of_day() -> ToClient {
        ToClient::TimeOfDay { time: 6000, speed: 72.0 }
    }

    /// Walks a fresh context all the way to ChatLogging.
    fn chat_logging_context(dispatcher: &Dispatcher<FixedSrp>) -> SessionContext<FixedSrp> {
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::FIRST_SRP, SERIALIZE_VERSION));
        dispatcher.dispatch(&mut ctx, time_of_day());
        dispatcher.dispatch(&mut ctx, ToClient::Breath { breath: 10 });
        assert_eq!(ctx.state(), ClientState::ChatLogging);
        ctx
    }

    // =====================================================================
    // Hello
    // =====================================================================

    #[test]
    fn test_hello_with_registration_sends_first_srp_and_enters_init() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let actions = dispatcher.dispatch(
            &mut ctx,
            hello(AuthMethods::SRP | AuthMethods::FIRST_SRP, SERIALIZE_VERSION),
        );

        assert_eq!(
            actions,
            vec![
                Action::StartEmitter,
                Action::Send(ToServer::FirstSrp {
                    salt: vec![0x5],
                    verifier: vec![0x7],
                    empty_password: false,
                }),
            ]
        );
        assert_eq!(ctx.state(), ClientState::Init);
        assert_eq!(ctx.auth().method, AuthMethod::FirstTime);
    }

    #[test]
    fn test_hello_with_login_sends_public_ephemeral() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let actions = dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        assert_eq!(
            actions[1],
            Action::Send(ToServer::SrpBytesA { a: vec![0xA], no_sha1: true })
        );
    }

    #[test]
    fn test_hello_without_srp_bits_falls_back_to_login() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let actions = dispatcher.dispatch(&mut ctx, hello(AuthMethods::NONE, SERIALIZE_VERSION));

        assert_eq!(
            actions,
            vec![
                Action::StartEmitter,
                Action::Send(ToServer::SrpBytesA { a: vec![0xA], no_sha1: true }),
            ]
        );
        assert_eq!(ctx.auth().method, AuthMethod::Login);
    }

    #[test]
    fn test_hello_version_mismatch_advances_but_sends_nothing() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let actions = dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, 27));

        assert_eq!(actions, vec![Action::StartEmitter]);
        assert_eq!(ctx.state(), ClientState::Init);
    }

    #[test]
    fn test_duplicate_hello_is_ignored() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));
        let auth_before = ctx.auth().clone();

        let actions = dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        assert!(actions.is_empty());
        assert_eq!(ctx.state(), ClientState::Init);
        assert_eq!(ctx.auth(), &auth_before);
    }

    // =====================================================================
    // SRP challenge and acceptance
    // =====================================================================

    #[test]
    fn test_challenge_during_login_sends_proof() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::SrpBytesSaltB { salt: vec![1], b: vec![2] },
        );

        assert_eq!(actions, vec![Action::Send(ToServer::SrpBytesM { m: vec![0xF0] })]);
    }

    #[test]
    fn test_challenge_during_registration_is_ignored() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::FIRST_SRP, SERIALIZE_VERSION));
        let auth_before = ctx.auth().clone();

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::SrpBytesSaltB { salt: vec![1], b: vec![2] },
        );

        assert!(actions.is_empty());
        assert_eq!(ctx.auth(), &auth_before);
    }

    #[test]
    fn test_accept_auth_resets_context_and_sends_init2() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::AcceptAuth { player_pos: Position::default(), map_seed: 1 },
        );

        assert_eq!(actions, vec![Action::Send(ToServer::Init2 { lang: "en_US".into() })]);
        assert!(ctx.auth().is_empty());
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    #[test]
    fn test_time_of_day_in_init_sends_ready_once() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        let first = dispatcher.dispatch(&mut ctx, time_of_day());
        let second = dispatcher.dispatch(&mut ctx, time_of_day());

        assert_eq!(first, vec![Action::Send(ToServer::client_ready())]);
        assert!(second.is_empty());
        assert_eq!(ctx.state(), ClientState::Active);
    }

    #[test]
    fn test_time_of_day_before_hello_is_ignored() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        assert!(dispatcher.dispatch(&mut ctx, time_of_day()).is_empty());
        assert_eq!(ctx.state(), ClientState::Created);
    }

    #[test]
    fn test_breath_outside_active_does_not_advance() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        dispatcher.dispatch(&mut ctx, ToClient::Breath { breath: 10 });

        assert_eq!(ctx.state(), ClientState::Init);
    }

    #[test]
    fn test_states_visit_in_order_under_noisy_input() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        let rx = ctx.subscribe();
        let mut seen = vec![*rx.borrow()];

        let script = [
            ToClient::Breath { breath: 1 },
            time_of_day(),
            hello(AuthMethods::SRP, SERIALIZE_VERSION),
            hello(AuthMethods::SRP, SERIALIZE_VERSION),
            ToClient::Breath { breath: 1 },
            time_of_day(),
            hello(AuthMethods::SRP, SERIALIZE_VERSION),
            time_of_day(),
            ToClient::Breath { breath: 1 },
            ToClient::Breath { breath: 1 },
            time_of_day(),
        ];
        for msg in script {
            dispatcher.dispatch(&mut ctx, msg);
            let state = *rx.borrow();
            if seen.last() != Some(&state) {
                seen.push(state);
            }
        }

        assert_eq!(
            seen,
            vec![
                ClientState::Created,
                ClientState::Init,
                ClientState::Active,
                ClientState::ChatLogging,
            ]
        );
    }

    // =====================================================================
    // Misc handlers
    // =====================================================================

    #[test]
    fn test_deny_access_requests_session_end() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let deny = ToClient::DenyAccess {
            reason: "banned".into(),
        };

        let actions = dispatcher.dispatch(&mut ctx, deny);

        assert_eq!(actions, vec![Action::Deny { reason: "banned".into() }]);
    }

    #[test]
    fn test_death_screen_requests_respawn() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let actions = dispatcher.dispatch(&mut ctx, ToClient::DeathScreen { point_cam: false });

        assert_eq!(actions, vec![Action::Send(ToServer::Respawn)]);
    }

    #[test]
    fn test_move_player_overwrites_position() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        let first = Position { x: 1.0, y: 2.0, z: 3.0 };
        let second = Position { x: -4.0, y: 0.5, z: 9.0 };

        dispatcher.dispatch(&mut ctx, ToClient::MovePlayer { pos: first, pitch: 0.0, yaw: 0.0 });
        dispatcher.dispatch(&mut ctx, ToClient::MovePlayer { pos: second, pitch: 10.0, yaw: 90.0 });

        assert_eq!(
            ctx.position(),
            PlayerPosition { pos: second, pitch: 10.0, yaw: 90.0 }
        );
    }

    #[test]
    fn test_unknown_and_unhandled_kinds_are_no_ops() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();
        let auth_before = ctx.auth().clone();

        assert!(dispatcher.dispatch(&mut ctx, ToClient::Unknown).is_empty());
        assert!(dispatcher.dispatch(&mut ctx, ToClient::Hp { hp: 20 }).is_empty());

        assert_eq!(ctx.state(), ClientState::Created);
        assert_eq!(ctx.auth(), &auth_before);
        assert_eq!(ctx.position(), PlayerPosition::default());
    }

    #[test]
    fn test_register_adds_handler_for_new_kind() {
        fn on_hp(_ctx: &mut SessionContext<FixedSrp>, _msg: ToClient) -> Vec<Action> {
            vec![Action::Send(ToServer::Respawn)]
        }

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(MessageKind::Hp, on_hp);
        let mut ctx = context();

        let actions = dispatcher.dispatch(&mut ctx, ToClient::Hp { hp: 0 });

        assert_eq!(actions, vec![Action::Send(ToServer::Respawn)]);
    }

    #[test]
    fn test_empty_dispatcher_ignores_everything() {
        let dispatcher = Dispatcher::empty();
        let mut ctx = context();

        let actions = dispatcher.dispatch(&mut ctx, hello(AuthMethods::SRP, SERIALIZE_VERSION));

        assert!(actions.is_empty());
        assert_eq!(ctx.state(), ClientState::Created);
    }

    // =====================================================================
    // Chat
    // =====================================================================

    #[test]
    fn test_chat_before_chat_logging_is_ignored() {
        let dispatcher = Dispatcher::new();
        let mut ctx = context();

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::ChatMessage { text: "<alice> the dog".into() },
        );

        assert!(actions.is_empty());
    }

    #[test]
    fn test_chat_from_other_player_gets_seeded_reply() {
        let dispatcher = Dispatcher::new();
        let mut ctx = chat_logging_context(&dispatcher);

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::ChatMessage { text: "<alice> dog".into() },
        );

        assert_eq!(
            actions,
            vec![Action::Send(ToServer::ChatMessage { msg: "dog ran.".into() })]
        );
    }

    #[test]
    fn test_chat_from_self_is_ignored() {
        let dispatcher = Dispatcher::new();
        let mut ctx = chat_logging_context(&dispatcher);

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::ChatMessage { text: "<bot> the cat sat.".into() },
        );

        assert!(actions.is_empty());
    }

    #[test]
    fn test_chat_with_only_sender_tag_seeds_from_model() {
        let dispatcher = Dispatcher::new();
        let mut ctx = chat_logging_context(&dispatcher);

        let actions = dispatcher.dispatch(
            &mut ctx,
            ToClient::ChatMessage { text: "<alice>".into() },
        );

        let [Action::Send(ToServer::ChatMessage { msg })] = actions.as_slice() else {
            panic!("expected one chat reply, got {actions:?}");
        };
        let start = msg.split(' ').next().unwrap();
        assert!(ctx.model().contains(start));
    }
}
