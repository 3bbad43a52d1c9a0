//! Vote Relay server
//!
//! Receives vote-created events over HTTP and relays them to the spreadsheet
//! webhook.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use vote_relay::{IdentityToolkitLookup, RelayConfig, TokenSource, VoteRelay};

/// Vote Relay server
#[derive(Parser, Debug)]
#[command(name = "vote-relay")]
#[command(version)]
#[command(about = "Relays new vote records to a spreadsheet webhook")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Firebase project used for user lookups
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    identity_project: String,

    /// Static access token for user lookups (defaults to the metadata server)
    #[arg(long, env = "VOTE_RELAY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config = RelayConfig::from_env().context("failed to load relay configuration")?;

    let token_source = match args.access_token {
        Some(token) => TokenSource::Static(token),
        None => TokenSource::MetadataServer,
    };
    let identity = IdentityToolkitLookup::new(&args.identity_project, token_source)?;

    let relay = Arc::new(VoteRelay::new(config, Arc::new(identity))?);
    let app = vote_relay::trigger_router(relay);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        "{} v{} listening on {}",
        vote_relay::NAME,
        vote_relay::VERSION,
        addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}
