//! Per-connection worker: framed request loop, key locking, dispatch.

use std::net::TcpStream;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::frame;
use crate::protocol::{Request, StateReply};
use crate::service::Service;

/// Outcome of one dispatched request.
enum Flow {
    Continue,
    Close,
}

/// One client connection, processed to completion on its own thread.
pub struct Session {
    stream: TcpStream,
    service: Arc<Service>,
}

impl Session {
    pub fn new(stream: TcpStream, service: Arc<Service>) -> Self {
        Self { stream, service }
    }

    /// Run the request loop until CLOSE, peer disconnect, or a fatal error.
    ///
    /// Requests within a batch and across batches are handled strictly in
    /// order; a request's reply is written before the next request starts.
    pub fn run(mut self) {
        let peer = self
            .stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        'conn: loop {
            let max_frame_len = self.service.config().max_frame_len;
            let payload = match frame::recv(&mut self.stream, max_frame_len) {
                Ok(payload) => payload,
                Err(ServerError::TransportClosed) => {
                    debug!(%peer, "peer closed connection");
                    break;
                }
                Err(err) => {
                    warn!(%peer, %err, "dropping connection");
                    break;
                }
            };

            let batch: Vec<Request> = match serde_json::from_slice(&payload) {
                Ok(batch) => batch,
                Err(err) => {
                    warn!(%peer, %err, "malformed request batch, dropping connection");
                    break;
                }
            };

            for request in batch {
                match self.process(&request) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Close) => break 'conn,
                    Err(err) if err.is_fatal() => {
                        warn!(%peer, %err, "dropping connection");
                        break 'conn;
                    }
                    Err(err) => {
                        warn!(%peer, request = request.type_name(), %err, "request failed");
                    }
                }
            }
        }

        info!(%peer, "closing connection");
    }

    /// Acquire the enlarged key set's locks in sorted order, then execute.
    fn process(&mut self, request: &Request) -> ServerResult<Flow> {
        let declared = request.declared_keys().to_vec();
        loop {
            let held = self.service.enlarged_key_set(&declared);
            let handles: Vec<_> = held
                .iter()
                .map(|key| self.service.locks().entry(key))
                .collect();
            let guards: Vec<_> = handles
                .iter()
                .map(|lock| lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
                .collect();

            // Another request may have grown a compound system between
            // enlargement and acquisition; retry until the held set covers
            // every partner.
            if !self.service.enlargement_covers(&declared, &held) {
                drop(guards);
                continue;
            }

            let flow = self.execute(request);
            drop(guards);
            return flow;
        }
    }

    fn execute(&mut self, request: &Request) -> ServerResult<Flow> {
        match request {
            Request::Set { keys, args } => {
                self.service
                    .registry()
                    .set_amplitudes(keys, &args.amplitudes)?;
                Ok(Flow::Continue)
            }
            Request::Get { keys } => {
                let key = keys
                    .first()
                    .ok_or(ServerError::BadRequest("GET names no key"))?;
                let record = self.service.registry().get(key)?;
                let reply = StateReply {
                    keys: record.keys().to_vec(),
                    state: record.interleaved(),
                };
                self.reply(&reply)?;
                Ok(Flow::Continue)
            }
            Request::Run { args, .. } => {
                let measured =
                    self.service
                        .kernel()
                        .run_circuit(&args.circuit, &args.keys, args.meas_samp)?;
                if !measured.is_empty() {
                    self.reply(&measured)?;
                }
                Ok(Flow::Continue)
            }
            Request::Remove { keys } => {
                let key = keys
                    .first()
                    .ok_or(ServerError::BadRequest("REMOVE names no key"))?;
                self.service.registry().remove(key)?;
                Ok(Flow::Continue)
            }
            Request::Sync => {
                self.reply(&true)?;
                Ok(Flow::Continue)
            }
            Request::Close => Ok(Flow::Close),
            Request::Terminate => {
                info!("terminate requested, stopping listener");
                self.service.request_shutdown();
                self.service.wake_listener();
                Ok(Flow::Close)
            }
            Request::Unknown => {
                warn!("unknown request type, skipping");
                Ok(Flow::Continue)
            }
        }
    }

    fn reply<T: Serialize>(&mut self, value: &T) -> ServerResult<()> {
        let payload = serde_json::to_vec(value)?;
        frame::send(&mut self.stream, &payload)
    }
}
