//! Circuit execution: state preparation, memoized gate application, and
//! projective measurement.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use num_complex::Complex64;

use crate::cache::LruCache;
use crate::circuit::{Circuit, GateKind, GateOp};
use crate::error::{KernelError, KernelResult};
use crate::gates;
use crate::measure::{self, MeasureTable};
use crate::registry::StateRegistry;

/// Default bound of each gate/measurement cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Cache key: an input amplitude vector plus the index sequence a gate or
/// measurement was addressed with.
///
/// Equality and hashing go through the raw f64 bit patterns; a hit requires
/// the bit-identical input vector, which is what memoization wants.
#[derive(Debug, Clone)]
pub struct StateKey {
    amplitudes: Vec<Complex64>,
    indices: Vec<usize>,
}

impl StateKey {
    fn new(amplitudes: &[Complex64], indices: &[usize]) -> Self {
        Self {
            amplitudes: amplitudes.to_vec(),
            indices: indices.to_vec(),
        }
    }
}

impl PartialEq for StateKey {
    fn eq(&self, other: &Self) -> bool {
        self.indices == other.indices
            && self.amplitudes.len() == other.amplitudes.len()
            && self
                .amplitudes
                .iter()
                .zip(&other.amplitudes)
                .all(|(a, b)| {
                    a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
                })
    }
}

impl Eq for StateKey {}

impl Hash for StateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for amp in &self.amplitudes {
            state.write_u64(amp.re.to_bits());
            state.write_u64(amp.im.to_bits());
        }
        self.indices.hash(state);
    }
}

/// One bounded cache per gate name plus one for measurement tables.
pub struct CacheBank {
    h: LruCache<StateKey, Vec<Complex64>>,
    x: LruCache<StateKey, Vec<Complex64>>,
    y: LruCache<StateKey, Vec<Complex64>>,
    z: LruCache<StateKey, Vec<Complex64>>,
    cx: LruCache<StateKey, Vec<Complex64>>,
    swap: LruCache<StateKey, Vec<Complex64>>,
    measure: LruCache<StateKey, Arc<MeasureTable>>,
}

impl CacheBank {
    /// Create a bank where every cache is bounded to `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            h: LruCache::new(capacity),
            x: LruCache::new(capacity),
            y: LruCache::new(capacity),
            z: LruCache::new(capacity),
            cx: LruCache::new(capacity),
            swap: LruCache::new(capacity),
            measure: LruCache::new(capacity),
        }
    }

    fn gate(&self, kind: GateKind) -> &LruCache<StateKey, Vec<Complex64>> {
        match kind {
            GateKind::H => &self.h,
            GateKind::X => &self.x,
            GateKind::Y => &self.y,
            GateKind::Z => &self.z,
            GateKind::Cx => &self.cx,
            GateKind::Swap => &self.swap,
        }
    }
}

/// Executes circuits against the shared registry, memoizing the gate and
/// measurement arithmetic in a cache bank.
///
/// The kernel holds no per-key locks itself; callers serialize requests
/// over the keys they touch before invoking it. A kernel call holds at most
/// one cache mutex at a time and never holds one across registry access.
pub struct QuantumKernel {
    registry: Arc<StateRegistry>,
    caches: CacheBank,
}

impl QuantumKernel {
    pub fn new(registry: Arc<StateRegistry>, cache_capacity: usize) -> Self {
        Self {
            registry,
            caches: CacheBank::new(cache_capacity),
        }
    }

    /// The registry this kernel reads and mutates.
    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    /// Apply `circuit` to the subsystems covering `keys`, then either store
    /// the evolved state (no measured qubits) or measure and collapse.
    ///
    /// Returns the measured key → bit map, empty when nothing is measured.
    pub fn run_circuit(
        &self,
        circuit: &Circuit,
        keys: &[String],
        meas_samp: f64,
    ) -> KernelResult<BTreeMap<String, u8>> {
        let (mut state, all_keys) = self.prepare_state(keys)?;

        for gate in &circuit.gates {
            state = self.apply_gate(&state, gate)?;
        }

        if circuit.measured_qubits.is_empty() {
            self.registry.set_vector(&all_keys, state)?;
            return Ok(BTreeMap::new());
        }
        self.measure(&state, &circuit.measured_qubits, &all_keys, meas_samp)
    }

    /// Consolidate every record touching `keys` into one compound vector,
    /// reordered so positions `0..keys.len()` hold `keys` in request order.
    fn prepare_state(&self, keys: &[String]) -> KernelResult<(Vec<Complex64>, Vec<String>)> {
        let mut all_keys: Vec<String> = Vec::new();
        let mut collected: Vec<Arc<crate::state::Subsystem>> = Vec::new();

        for key in keys {
            if all_keys.iter().any(|k| k == key) {
                continue;
            }
            let record = self.registry.get(key)?;
            all_keys.extend(record.keys().iter().cloned());
            collected.push(record);
        }

        let mut state = vec![Complex64::new(1.0, 0.0)];
        for record in &collected {
            state = gates::kron(&state, record.amplitudes());
        }

        // Swap requested keys into the leading positions, one slot per
        // distinct key.
        let mut front = 0;
        for key in keys {
            if all_keys[..front].iter().any(|k| k == key) {
                continue;
            }
            if all_keys[front] != *key {
                let j = all_keys
                    .iter()
                    .position(|k| k == key)
                    .ok_or_else(|| KernelError::KeyAbsent(key.clone()))?;
                state = gates::swap(&state, front, j);
                all_keys.swap(front, j);
            }
            front += 1;
        }

        Ok((state, all_keys))
    }

    /// Apply one gate through its cache.
    fn apply_gate(&self, state: &[Complex64], gate: &GateOp) -> KernelResult<Vec<Complex64>> {
        let kind = GateKind::parse(&gate.name)?;
        if gate.indices.len() != kind.arity() {
            return Err(KernelError::ArityMismatch {
                gate: kind.name(),
                expected: kind.arity(),
                got: gate.indices.len(),
            });
        }
        let qubits = gates::num_qubits(state);
        if let Some(&index) = gate.indices.iter().find(|&&i| i >= qubits) {
            return Err(KernelError::IndexOutOfRange { index, qubits });
        }

        let key = StateKey::new(state, &gate.indices);
        self.caches.gate(kind).get_or_compute(&key, || match kind {
            GateKind::H => gates::hadamard(state, gate.indices[0]),
            GateKind::X => gates::pauli_x(state, gate.indices[0]),
            GateKind::Y => gates::pauli_y(state, gate.indices[0]),
            GateKind::Z => gates::pauli_z(state, gate.indices[0]),
            GateKind::Cx => gates::cnot(state, gate.indices[0], gate.indices[1]),
            GateKind::Swap => gates::swap(state, gate.indices[0], gate.indices[1]),
        })
    }

    /// Measure `indices`, write the collapsed records back, and return the
    /// measured key → bit map.
    fn measure(
        &self,
        state: &[Complex64],
        indices: &[usize],
        all_keys: &[String],
        samp: f64,
    ) -> KernelResult<BTreeMap<String, u8>> {
        let qubits = all_keys.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= qubits) {
            return Err(KernelError::IndexOutOfRange { index, qubits });
        }
        let mut seen = vec![false; qubits];
        for &index in indices {
            if seen[index] {
                return Err(KernelError::DuplicateIndex(index));
            }
            seen[index] = true;
        }

        let key = StateKey::new(state, indices);
        let table = self
            .caches
            .measure
            .get_or_compute(&key, || Arc::new(measure::measure_table(state, indices)))?;

        let outcome = measure::sample_outcome(&table.probs, samp);

        let mut results = BTreeMap::new();
        for (i, &index) in indices.iter().enumerate() {
            let bit = ((outcome >> (indices.len() - 1 - i)) & 1) as u8;
            let measured_key = &all_keys[index];
            self.registry
                .set_vector(std::slice::from_ref(measured_key), basis_state(bit))?;
            results.insert(measured_key.clone(), bit);
        }

        let unmeasured: Vec<String> = all_keys
            .iter()
            .enumerate()
            .filter(|&(i, _)| !indices.contains(&i))
            .map(|(_, k)| k.clone())
            .collect();
        if !unmeasured.is_empty() {
            self.registry
                .set_vector(&unmeasured, table.residuals[outcome].clone())?;
        }

        Ok(results)
    }
}

fn basis_state(bit: u8) -> Vec<Complex64> {
    if bit == 0 {
        vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]
    } else {
        vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (Arc<StateRegistry>, QuantumKernel) {
        let registry = Arc::new(StateRegistry::new());
        let kernel = QuantumKernel::new(Arc::clone(&registry), 16);
        (registry, kernel)
    }

    #[test]
    fn state_keys_compare_by_bits() {
        let a = StateKey::new(&[Complex64::new(1.0, 0.0)], &[0]);
        let b = StateKey::new(&[Complex64::new(1.0, 0.0)], &[0]);
        let c = StateKey::new(&[Complex64::new(1.0, 0.0)], &[1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn prepare_orders_requested_keys_first() {
        let (registry, kernel) = setup();
        registry
            .set_amplitudes(&keys(&["a"]), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        registry
            .set_amplitudes(&keys(&["b"]), &[0.0, 0.0, 1.0, 0.0])
            .unwrap();

        let (state, all_keys) = kernel.prepare_state(&keys(&["b", "a"])).unwrap();
        assert_eq!(all_keys, keys(&["b", "a"]));
        // |b a⟩ = |1 0⟩, index 2.
        assert!((state[2] - Complex64::new(1.0, 0.0)).norm() < 1e-10);
    }

    #[test]
    fn prepare_skips_duplicate_keys() {
        let (registry, kernel) = setup();
        registry
            .set_amplitudes(&keys(&["a"]), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        let (state, all_keys) = kernel.prepare_state(&keys(&["a", "a"])).unwrap();
        assert_eq!(all_keys, keys(&["a"]));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn gate_on_a_missing_key_is_key_absent() {
        let (_registry, kernel) = setup();
        let circuit = Circuit {
            size: 1,
            gates: vec![],
            measured_qubits: vec![],
        };
        assert!(matches!(
            kernel.run_circuit(&circuit, &keys(&["ghost"]), 0.0),
            Err(KernelError::KeyAbsent(_))
        ));
    }

    #[test]
    fn out_of_range_gate_index_is_rejected() {
        let (registry, kernel) = setup();
        registry
            .set_amplitudes(&keys(&["a"]), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        let circuit = Circuit {
            size: 1,
            gates: vec![GateOp {
                name: "x".into(),
                indices: vec![3],
            }],
            measured_qubits: vec![],
        };
        assert!(matches!(
            kernel.run_circuit(&circuit, &keys(&["a"]), 0.0),
            Err(KernelError::IndexOutOfRange { index: 3, qubits: 1 })
        ));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let (registry, kernel) = setup();
        registry
            .set_amplitudes(&keys(&["a"]), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        let circuit = Circuit {
            size: 1,
            gates: vec![GateOp {
                name: "cx".into(),
                indices: vec![0],
            }],
            measured_qubits: vec![],
        };
        assert!(matches!(
            kernel.run_circuit(&circuit, &keys(&["a"]), 0.0),
            Err(KernelError::ArityMismatch { expected: 2, got: 1, .. })
        ));
    }
}
