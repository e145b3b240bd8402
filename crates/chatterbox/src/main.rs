use std::sync::Arc;

use chatterbox::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Chat bot for voxel game servers.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Player name to log in (or register) as
    #[clap(short, long, env = "CHATTERBOX_NAME", default_value = "chatterbox")]
    name: String,
    /// Account password
    #[clap(short, long, env = "CHATTERBOX_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
    /// Server address, host:port
    #[clap(short, long, env = "CHATTERBOX_ADDRESS", default_value = "127.0.0.1:30000")]
    address: String,
    /// Training text for the chat generator
    #[clap(short, long, env = "CHATTERBOX_CORPUS", default_value = "input.txt")]
    corpus: std::path::PathBuf,
    /// Locale declared to the server
    #[clap(long, default_value = "en_US")]
    lang: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let client = ChatterboxClient::builder()
        .name(args.name)
        .password(args.password)
        .address(args.address)
        .corpus(args.corpus)
        .lang(args.lang)
        .build(Srp6a::new())
        .inspect_err(|e| tracing::error!(error = %e, "cannot load corpus"))?;

    let conn = client
        .connect()
        .await
        .inspect_err(|e| tracing::error!(error = %e, "cannot connect"))?;

    client.run(Arc::new(conn), shutdown_signal()).await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM / SIGHUP on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut term, mut hup) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(term), Ok(hup)) => (term, hup),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM/SIGHUP");
                ctrl_c.await;
                return;
            }
        };

        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
            _ = hup.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
