//! Subsystem records: the (key list, amplitude vector) pairs shared by
//! entangled registry keys.

use num_complex::Complex64;

use crate::error::{KernelError, KernelResult};

/// An immutable compound quantum state owned by one or more registry keys.
///
/// The amplitude vector always has length `2^keys.len()`. Records never
/// change after publication; mutation is by replacement, with the registry
/// repointing every affected key to the new record.
#[derive(Debug, Clone, PartialEq)]
pub struct Subsystem {
    keys: Vec<String>,
    amplitudes: Vec<Complex64>,
}

impl Subsystem {
    /// Build a record, checking the length invariant.
    pub fn new(keys: Vec<String>, amplitudes: Vec<Complex64>) -> KernelResult<Self> {
        if keys.is_empty() || amplitudes.len() != 1usize << keys.len() {
            return Err(KernelError::ShapeMismatch {
                keys: keys.len(),
                amplitudes: amplitudes.len(),
            });
        }
        Ok(Self { keys, amplitudes })
    }

    /// Build a record from a flat `[re0, im0, re1, im1, ...]` sequence of
    /// length `2·2^keys.len()`.
    pub fn from_interleaved(keys: Vec<String>, flat: &[f64]) -> KernelResult<Self> {
        if keys.is_empty() || flat.len() != 2 * (1usize << keys.len()) {
            return Err(KernelError::ShapeMismatch {
                keys: keys.len(),
                amplitudes: flat.len() / 2,
            });
        }
        let amplitudes = flat
            .chunks_exact(2)
            .map(|pair| Complex64::new(pair[0], pair[1]))
            .collect();
        Self::new(keys, amplitudes)
    }

    /// Keys sharing this record, in qubit order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The amplitude vector.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Number of qubits the record represents.
    pub fn num_qubits(&self) -> usize {
        self.keys.len()
    }

    /// Flat `[re0, im0, ...]` view, the shape GET replies carry.
    pub fn interleaved(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.amplitudes.len() * 2);
        for amp in &self.amplitudes {
            flat.push(amp.re);
            flat.push(amp.im);
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_round_trip() {
        let flat = [0.5, 0.0, 0.0, -0.5, 0.5, 0.5, 0.0, 0.0];
        let record = Subsystem::from_interleaved(vec!["a".into(), "b".into()], &flat).unwrap();
        assert_eq!(record.num_qubits(), 2);
        assert_eq!(record.amplitudes()[1], Complex64::new(0.0, -0.5));
        assert_eq!(record.interleaved(), flat);
    }

    #[test]
    fn wrong_amplitude_count_is_rejected() {
        let err = Subsystem::from_interleaved(vec!["a".into()], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            KernelError::ShapeMismatch { keys: 1, amplitudes: 1 }
        ));
    }

    #[test]
    fn empty_key_list_is_rejected() {
        let err = Subsystem::new(vec![], vec![Complex64::new(1.0, 0.0)]).unwrap_err();
        assert!(matches!(err, KernelError::ShapeMismatch { keys: 0, .. }));
    }
}
