//! Wire protocol: batched JSON requests and their replies.
//!
//! A request frame is a JSON array of objects tagged by `type`. Replies are
//! bare JSON values; SET, REMOVE, CLOSE, TERMINATE, and a RUN without
//! measured qubits produce none.

use kvant_kernel::Circuit;
use serde::{Deserialize, Serialize};

/// One request object from a client batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Bind keys to a fresh amplitude vector. No reply.
    #[serde(rename = "SET")]
    Set { keys: Vec<String>, args: SetArgs },

    /// Read back one key's record.
    #[serde(rename = "GET")]
    Get { keys: Vec<String> },

    /// Apply a circuit and optionally measure. Replies with the measured
    /// key → bit map when it is non-empty.
    #[serde(rename = "RUN")]
    Run { keys: Vec<String>, args: RunArgs },

    /// Drop one key's binding. No reply.
    #[serde(rename = "REMOVE")]
    Remove { keys: Vec<String> },

    /// Per-connection barrier; replies the JSON literal `true`.
    #[serde(rename = "SYNC")]
    Sync,

    /// End this connection.
    #[serde(rename = "CLOSE")]
    Close,

    /// Stop accepting new connections, then end this one.
    #[serde(rename = "TERMINATE")]
    Terminate,

    /// Anything else: logged and skipped.
    #[serde(other)]
    Unknown,
}

/// Arguments of a SET request.
#[derive(Debug, Clone, Deserialize)]
pub struct SetArgs {
    /// Interleaved `[re0, im0, re1, im1, ...]` amplitudes of length
    /// `2·2^keys`.
    pub amplitudes: Vec<f64>,
}

/// Arguments of a RUN request.
#[derive(Debug, Clone, Deserialize)]
pub struct RunArgs {
    /// The circuit to apply.
    pub circuit: Circuit,
    /// Keys the kernel consolidates and operates on, in request order.
    pub keys: Vec<String>,
    /// Uniform sample in `[0, 1)` driving the measurement outcome.
    pub meas_samp: f64,
}

impl Request {
    /// Keys the request declares for the locking protocol.
    pub fn declared_keys(&self) -> &[String] {
        match self {
            Request::Set { keys, .. }
            | Request::Get { keys }
            | Request::Run { keys, .. }
            | Request::Remove { keys } => keys,
            Request::Sync | Request::Close | Request::Terminate | Request::Unknown => &[],
        }
    }

    /// Wire name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Request::Set { .. } => "SET",
            Request::Get { .. } => "GET",
            Request::Run { .. } => "RUN",
            Request::Remove { .. } => "REMOVE",
            Request::Sync => "SYNC",
            Request::Close => "CLOSE",
            Request::Terminate => "TERMINATE",
            Request::Unknown => "UNKNOWN",
        }
    }
}

/// GET reply payload.
#[derive(Debug, Clone, Serialize)]
pub struct StateReply {
    /// The record's key list, in qubit order.
    pub keys: Vec<String>,
    /// Interleaved `[re0, im0, ...]` amplitudes.
    pub state: Vec<f64>,
}
