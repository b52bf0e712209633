//! `kvant-kernel` — the quantum core of the kvant state service.
//!
//! This crate owns the three pieces the service is built around:
//!
//! - **Registry** ([`StateRegistry`]): a key-grouped map of immutable
//!   [`Subsystem`] records, each an ordered key list plus a complex
//!   amplitude vector of length `2^keys`. Entangled keys share one record;
//!   mutation is by replacement under the registry's exclusive lock.
//! - **Caches** ([`LruCache`], [`CacheBank`]): bounded LRU stores with a
//!   two-phase reserve/publish protocol, so concurrent workers never repeat
//!   a gate application or measurement-table computation for the same
//!   input.
//! - **Kernel** ([`QuantumKernel`]): consolidates the records a request
//!   addresses into one compound vector (Kronecker product, big-endian
//!   qubit order), applies gates through the caches, and performs
//!   projective measurement driven by a client-supplied sample.
//!
//! The crate does no I/O and takes no per-key locks; `kvant-server` layers
//! the wire protocol and the locking discipline on top.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kvant_kernel::{Circuit, GateOp, QuantumKernel, StateRegistry};
//!
//! let registry = Arc::new(StateRegistry::new());
//! let kernel = QuantumKernel::new(Arc::clone(&registry), 64);
//!
//! registry.set_amplitudes(&["a".into()], &[1.0, 0.0, 0.0, 0.0]).unwrap();
//!
//! let circuit = Circuit {
//!     size: 1,
//!     gates: vec![GateOp { name: "x".into(), indices: vec![0] }],
//!     measured_qubits: vec![],
//! };
//! let measured = kernel.run_circuit(&circuit, &["a".into()], 0.0).unwrap();
//! assert!(measured.is_empty());
//!
//! let record = registry.get("a").unwrap();
//! assert_eq!(record.amplitudes()[1].re, 1.0);
//! ```

pub mod cache;
pub mod circuit;
pub mod error;
pub mod gates;
pub mod kernel;
pub mod measure;
pub mod registry;
pub mod state;

pub use cache::{LruCache, Probe};
pub use circuit::{Circuit, GateKind, GateOp};
pub use error::{KernelError, KernelResult};
pub use kernel::{CacheBank, QuantumKernel, StateKey, DEFAULT_CACHE_CAPACITY};
pub use measure::MeasureTable;
pub use registry::StateRegistry;
pub use state::Subsystem;
