//! sockutils
//!
//! Provisions a listening socket from a config file and/or flags, then
//! accepts connections and reports each peer.
//!
//! ```text
//! config.toml + flags
//!     → config (load, override, validate)
//!     → net::create_listening_socket
//!     → tokio AsyncFd readiness
//!     → net::accept_connection → report peer → close
//! ```

use std::os::fd::AsRawFd;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tokio::io::unix::AsyncFd;

use sockutils::config::{load_config, validate_config, ConfigError, ServiceConfig};
use sockutils::observability::init_logging;
use sockutils::{accept_connection, create_listening_socket, ListeningSocket, PeerInfo};

#[derive(Parser)]
#[command(name = "sockutils")]
#[command(about = "Provision a listening socket and report accepted peers", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address literal to bind (overrides config).
    #[arg(short, long)]
    address: Option<String>,

    /// Port to bind (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen backlog (overrides config).
    #[arg(long)]
    backlog: Option<i32>,

    /// Enable SO_REUSEADDR.
    #[arg(long)]
    reuse_addr: bool,

    /// Stop after this many connections (0 = until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    accept: usize,

    /// Print each peer as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Log level (overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Serialize)]
struct PeerReport<'a> {
    listener: &'a PeerInfo,
    peer: &'a PeerInfo,
}

fn build_config(cli: &Cli) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(address) = &cli.address {
        config.listener.address = address.clone();
    }
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(backlog) = cli.backlog {
        config.listener.options.listen_backlog = backlog;
    }
    if cli.reuse_addr {
        config.listener.options.reuse_addr = true;
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn accept_loop(
    listener: AsyncFd<ListeningSocket>,
    local: &PeerInfo,
    limit: usize,
    json: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut accepted = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    while limit == 0 || accepted < limit {
        let mut ready = tokio::select! {
            ready = listener.readable() => ready?,
            _ = &mut shutdown => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        };

        let conn = match accept_connection(listener.get_ref().as_raw_fd()) {
            Ok(conn) => conn,
            Err(err) if err.raw_os_error() == Some(libc::EAGAIN) => {
                ready.clear_ready();
                continue;
            }
            Err(err) if err.raw_os_error() == Some(libc::ECONNABORTED) => {
                tracing::warn!(error = %err, "Connection aborted before accept");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        accepted += 1;
        let peer = conn.peer();
        if json {
            let report = PeerReport {
                listener: local,
                peer,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            tracing::info!(
                peer_address = %peer.address(),
                peer_port = peer.port(),
                accepted,
                "Peer connected"
            );
        }
    }

    Ok(accepted)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    init_logging(&config.observability.log_level)?;

    tracing::info!(
        address = %config.listener.address,
        port = config.listener.port,
        backlog = config.listener.options.listen_backlog,
        "Configuration loaded"
    );

    let listener = create_listening_socket(
        &config.listener.address,
        config.listener.port,
        &config.listener.options,
    )?;
    let local = listener.local_address()?;

    tracing::info!(
        address = %local.address(),
        port = local.port(),
        transport = %listener.transport(),
        family = %listener.family(),
        "Listening for connections"
    );

    let listener = AsyncFd::new(listener)?;
    let accepted = accept_loop(listener, &local, cli.accept, cli.json).await?;

    tracing::info!(accepted, "Shutdown complete");
    Ok(())
}
