//! The SRP authentication handshake.
//!
//! Two variants, picked once from the server greeting:
//!
//! ```text
//! Login:      Hello ─→ SrpBytesA ─→ SrpBytesSaltB ─→ SrpBytesM ─→ AcceptAuth ─→ Init2
//! FirstTime:  Hello ─→ FirstSrp ─────────────────────────────────→ AcceptAuth ─→ Init2
//! ```
//!
//! Each step returns the message to send, or a [`SessionError`] that
//! aborts just that step. An aborted handshake is not retried; the
//! session stalls until the server or a timeout closes it.

use std::fmt;

use chatterbox_protocol::{AuthMethods, SERIALIZE_VERSION, ToServer};

use crate::{Credentials, Ephemeral, SessionError, Srp};

/// The handshake variant in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// No handshake in progress.
    #[default]
    None,
    /// SRP login against an existing account.
    Login,
    /// SRP registration of a new account.
    FirstTime,
}

impl AuthMethod {
    /// Picks a variant from the methods a server advertises. Registration
    /// wins when offered; anything else is answered with a login.
    pub fn negotiate(advertised: AuthMethods) -> Self {
        if advertised.contains(AuthMethods::FIRST_SRP) {
            Self::FirstTime
        } else {
            Self::Login
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Login => write!(f, "SRP login"),
            Self::FirstTime => write!(f, "SRP registration"),
        }
    }
}

/// Key material gathered across handshake steps.
///
/// Starts empty, fills in as the handshake proceeds, and is wiped the
/// moment the server accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub method: AuthMethod,
    pub salt: Vec<u8>,
    pub client_public: Vec<u8>,
    pub client_secret: Vec<u8>,
    pub shared_key: Vec<u8>,
}

impl AuthContext {
    /// Returns `true` if no handshake is in progress.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drives one session's authentication.
pub struct Handshake<S: Srp> {
    srp: S,
    credentials: Credentials,
    lang: String,
    context: AuthContext,
}

impl<S: Srp> Handshake<S> {
    /// `lang` is the locale declared once authentication is accepted.
    pub fn new(srp: S, credentials: Credentials, lang: impl Into<String>) -> Self {
        Self {
            srp,
            credentials,
            lang: lang.into(),
            context: AuthContext::default(),
        }
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Starts authenticating in answer to the server greeting.
    ///
    /// Records the negotiated method, checks the serialization version,
    /// then produces the first message of the chosen variant.
    ///
    /// # Errors
    /// - [`SessionError::UnexpectedAuthentication`] — a handshake is
    ///   already in progress; nothing changes
    /// - [`SessionError::VersionMismatch`] — the method stays recorded, so
    ///   a repeated greeting is rejected as unexpected
    pub fn begin(
        &mut self,
        advertised: AuthMethods,
        serialize_ver: u8,
    ) -> Result<ToServer, SessionError> {
        if self.context.method != AuthMethod::None {
            return Err(SessionError::UnexpectedAuthentication);
        }

        let method = AuthMethod::negotiate(advertised);
        self.context.method = method;

        if serialize_ver != SERIALIZE_VERSION {
            return Err(SessionError::VersionMismatch {
                expected: SERIALIZE_VERSION,
                actual: serialize_ver,
            });
        }

        tracing::info!(%method, "starting authentication");

        if method == AuthMethod::FirstTime {
            let reg = self.srp.new_registration(&self.credentials)?;
            self.context.salt = reg.salt.clone();
            return Ok(ToServer::FirstSrp {
                salt: reg.salt,
                verifier: reg.verifier,
                empty_password: false,
            });
        }

        let Ephemeral { public, secret } = self.srp.initiate()?;
        self.context.client_public = public.clone();
        self.context.client_secret = secret;
        Ok(ToServer::SrpBytesA {
            a: public,
            no_sha1: true,
        })
    }

    /// Answers the server's login challenge with a proof.
    ///
    /// # Errors
    /// - [`SessionError::WrongAuthVariant`] — we aren't doing a login
    /// - [`SessionError::UnexpectedAuthentication`] — the challenge was
    ///   already answered
    /// - [`SessionError::SafetyCheckFailed`] / [`SessionError::Srp`] — the
    ///   challenge is unusable
    ///
    /// The context is untouched on every error.
    pub fn respond(
        &mut self,
        salt: &[u8],
        server_public: &[u8],
    ) -> Result<ToServer, SessionError> {
        if self.context.method != AuthMethod::Login {
            return Err(SessionError::WrongAuthVariant {
                expected: AuthMethod::Login,
                actual: self.context.method,
            });
        }
        if !self.context.shared_key.is_empty() {
            return Err(SessionError::UnexpectedAuthentication);
        }

        let ephemeral = Ephemeral {
            public: self.context.client_public.clone(),
            secret: self.context.client_secret.clone(),
        };
        let shared_key =
            self.srp
                .complete(&ephemeral, &self.credentials, salt, server_public)?;
        let proof = self.srp.client_proof(
            &self.credentials.name,
            salt,
            &ephemeral.public,
            server_public,
            &shared_key,
        )?;

        self.context.salt = salt.to_vec();
        self.context.shared_key = shared_key;
        Ok(ToServer::SrpBytesM { m: proof })
    }

    /// The server accepted us: wipe the key material and declare our locale.
    pub fn accept(&mut self) -> ToServer {
        tracing::info!(method = %self.context.method, "authentication accepted");
        self.context.reset();
        ToServer::Init2 {
            lang: self.lang.clone(),
        }
    }
}
