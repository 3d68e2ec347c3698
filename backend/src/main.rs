//! Service entry-point: loads session settings and serves the session routes.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::net::SocketAddr;

use clap::Parser;
use mockable::DefaultEnv;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use session_gate::inbound::http::session_config::session_settings_from_env;
use session_gate::server::{ServerConfig, create_server};

/// `session-gate` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "session-gate",
    about = "Serve the session-authenticated API",
    version
)]
struct CliArgs {
    /// Socket address to listen on.
    #[arg(long, value_name = "addr", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = session_settings_from_env(&DefaultEnv::new()).map_err(|err| {
        error!(error = %err, "invalid session configuration");
        io::Error::other(err)
    })?;

    create_server(ServerConfig::new(settings, args.bind))?.await
}
