//! `kvant-server` — framed TCP surface of the kvant quantum-state service.
//!
//! Clients connect over a stream socket and exchange length-prefixed JSON
//! batches (see [`protocol`]). Each accepted connection gets its own OS
//! thread, which decodes frames, acquires the per-key locks its request
//! touches, and dispatches to the registry and kernel in `kvant-kernel`.
//!
//! # Locking discipline
//!
//! Before a request runs, its declared keys are *enlarged* to the union of
//! every partner key in the records it touches, the enlarged set is sorted,
//! and the per-key locks are acquired in that order. The single global
//! acquisition order is the deadlock-avoidance discipline: two requests
//! with overlapping key sets always serialize on at least one lock, and no
//! cycle of lock waits can form. After acquisition the enlargement is
//! re-checked and retried if a concurrent request grew one of the compound
//! systems in between.

pub mod config;
pub mod error;
pub mod frame;
pub mod locks;
pub mod protocol;
pub mod server;
pub mod service;
pub mod session;
pub mod tracing_config;

pub use config::{ConfigError, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::serve;
pub use service::Service;
