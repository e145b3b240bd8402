//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use chatterbox_session::Credentials;

/// Everything the client needs to know before it dials.
///
/// `Default` gives a local test server and the stock timings; override the
/// fields you care about.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Account to log in (or register) as.
    pub credentials: Credentials,

    /// Server address, `host:port`.
    pub address: String,

    /// Plain-text training corpus for the chat generator.
    pub corpus_path: PathBuf,

    /// Locale declared once authentication is accepted.
    pub lang: String,

    /// How often the greeting is resent while the server hasn't answered.
    pub greeting_interval: Duration,

    /// How long to wait for the server to answer the greeting before
    /// closing the connection.
    pub greeting_timeout: Duration,

    /// How often an unprompted chat line is sent once authenticated.
    pub chat_interval: Duration,

    /// Silence after which the transport reports a timeout.
    pub idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::new("chatterbox", ""),
            address: "127.0.0.1:30000".to_string(),
            corpus_path: PathBuf::from("input.txt"),
            lang: "en_US".to_string(),
            greeting_interval: Duration::from_millis(500),
            greeting_timeout: Duration::from_secs(10),
            chat_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.greeting_interval, Duration::from_millis(500));
        assert_eq!(cfg.greeting_timeout, Duration::from_secs(10));
        assert_eq!(cfg.chat_interval, Duration::from_secs(30));
        assert_eq!(cfg.lang, "en_US");
    }
}
