//! Circuit wire format and the gate vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// One gate invocation: a wire name plus the qubit indices it addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOp {
    /// Wire gate name (`h`, `x`, `y`, `z`, `cx`, `swap`).
    pub name: String,
    /// Qubit positions; one for the single-qubit gates, (control, target)
    /// for `cx`, the exchanged pair for `swap`.
    pub indices: Vec<usize>,
}

/// A gate circuit as submitted by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits the client laid the circuit out for.
    pub size: usize,
    /// Gates in application order.
    pub gates: Vec<GateOp>,
    /// Qubit positions to measure after the gates; may be empty.
    pub measured_qubits: Vec<usize>,
}

/// The supported gate vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Hadamard.
    H,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Controlled-X; control first, target second.
    Cx,
    /// Qubit exchange.
    Swap,
}

impl GateKind {
    /// Parse a wire gate name.
    pub fn parse(name: &str) -> KernelResult<Self> {
        match name {
            "h" => Ok(GateKind::H),
            "x" => Ok(GateKind::X),
            "y" => Ok(GateKind::Y),
            "z" => Ok(GateKind::Z),
            "cx" => Ok(GateKind::Cx),
            "swap" => Ok(GateKind::Swap),
            other => Err(KernelError::UnknownGate(other.to_string())),
        }
    }

    /// The wire name.
    pub fn name(self) -> &'static str {
        match self {
            GateKind::H => "h",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::Cx => "cx",
            GateKind::Swap => "swap",
        }
    }

    /// Number of qubit indices the gate consumes.
    pub fn arity(self) -> usize {
        match self {
            GateKind::H | GateKind::X | GateKind::Y | GateKind::Z => 1,
            GateKind::Cx | GateKind::Swap => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_wire_shape() {
        let circuit: Circuit = serde_json::from_str(
            r#"{
                "size": 2,
                "gates": [
                    {"name": "h", "indices": [0]},
                    {"name": "cx", "indices": [0, 1]}
                ],
                "measured_qubits": [0, 1]
            }"#,
        )
        .unwrap();
        assert_eq!(circuit.size, 2);
        assert_eq!(circuit.gates.len(), 2);
        assert_eq!(circuit.gates[1].indices, vec![0, 1]);
        assert_eq!(circuit.measured_qubits, vec![0, 1]);
    }

    #[test]
    fn unknown_names_are_kernel_errors() {
        assert!(matches!(
            GateKind::parse("t"),
            Err(KernelError::UnknownGate(name)) if name == "t"
        ));
    }

    #[test]
    fn arities_match_the_vocabulary() {
        assert_eq!(GateKind::parse("h").unwrap().arity(), 1);
        assert_eq!(GateKind::parse("cx").unwrap().arity(), 2);
        assert_eq!(GateKind::parse("swap").unwrap().arity(), 2);
    }
}
