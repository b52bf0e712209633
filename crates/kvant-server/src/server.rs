//! TCP listener: accept loop and worker lifecycle.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::service::Service;
use crate::session::Session;

/// Bind and serve until `max_clients` connections have been accepted (or a
/// TERMINATE request stops the listener), then join every worker.
///
/// One OS thread per connection; each runs its session to completion.
pub fn serve(config: ServerConfig) -> ServerResult<()> {
    config.validate()?;
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)?;

    if config.formalism != "ket_vector" {
        warn!(formalism = %config.formalism, "formalism is accepted but not interpreted");
    }
    info!(%addr, max_clients = config.max_clients, "listening");

    let service = Arc::new(Service::new(config));
    let mut workers = Vec::new();

    while workers.len() < service.config().max_clients {
        let (stream, peer) = match listener.accept() {
            Ok(conn) => conn,
            Err(err) => {
                error!(%err, "accept failed");
                break;
            }
        };
        if service.shutdown_requested() {
            drop(stream);
            break;
        }
        info!(%peer, "client connected");
        let service = Arc::clone(&service);
        workers.push(
            thread::Builder::new()
                .name(format!("kvant-client-{peer}"))
                .spawn(move || Session::new(stream, service).run())?,
        );
    }

    info!(workers = workers.len(), "listener done, joining workers");
    for worker in workers {
        if worker.join().is_err() {
            warn!("worker panicked");
        }
    }
    info!("all workers joined");
    Ok(())
}
