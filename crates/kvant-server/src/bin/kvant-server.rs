//! The kvant quantum-state server binary.
//!
//! ```text
//! kvant-server <ip> <port> <max_clients> <formalism> <log_path>
//! ```
//!
//! Exits 0 after every worker has joined; non-zero when binding fails or
//! the port falls outside [2000, 65535].

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use kvant_server::config::ServerConfig;
use kvant_server::tracing_config::init_tracing;

/// Multi-client quantum-state service over framed TCP.
#[derive(Parser)]
#[command(name = "kvant-server", version, about)]
struct Cli {
    /// Address to listen on.
    ip: IpAddr,

    /// Listening port (2000-65535).
    port: u16,

    /// Number of client connections to accept before shutting down.
    max_clients: usize,

    /// State formalism requested by the deployment (only "ket_vector" is
    /// interpreted).
    formalism: String,

    /// File to write logs to.
    log_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(Some(&cli.log_path)).context("failed to open log file")?;

    let config = ServerConfig::new(
        cli.ip,
        cli.port,
        cli.max_clients,
        cli.formalism,
        Some(cli.log_path),
    );
    kvant_server::serve(config).context("server failed")?;
    Ok(())
}
