//! Error types for the kernel crate.

use thiserror::Error;

/// Result type for kernel operations.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Errors that can occur in registry and kernel operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// Gate name outside the supported vocabulary.
    #[error("unknown gate '{0}'")]
    UnknownGate(String),

    /// Request named a key with no registry binding.
    #[error("key '{0}' not found in registry")]
    KeyAbsent(String),

    /// Amplitude count inconsistent with the number of keys.
    #[error("amplitude vector of length {amplitudes} does not fit {keys} key(s)")]
    ShapeMismatch {
        /// Number of keys the record was built for.
        keys: usize,
        /// Number of complex amplitudes supplied.
        amplitudes: usize,
    },

    /// Gate addressed with the wrong number of qubit indices.
    #[error("gate '{gate}' expects {expected} index(es), got {got}")]
    ArityMismatch {
        /// Name of the gate.
        gate: &'static str,
        /// Indices the gate consumes.
        expected: usize,
        /// Indices actually supplied.
        got: usize,
    },

    /// Qubit index outside the prepared state.
    #[error("qubit index {index} out of range for {qubits}-qubit state")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Width of the state it was applied to.
        qubits: usize,
    },

    /// Qubit index repeated in a measurement request.
    #[error("duplicate qubit index {0} in measurement")]
    DuplicateIndex(usize),

    /// The thread computing a shared cache entry died before publishing.
    #[error("pending cache computation failed")]
    ComputeFailed,
}
