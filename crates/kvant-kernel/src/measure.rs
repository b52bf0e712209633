//! Projective computational-basis measurement.

use num_complex::Complex64;

use crate::gates::num_qubits;

/// Full outcome table for measuring a fixed set of qubit positions.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureTable {
    /// `probs[r]` is the probability of outcome `r`, whose bits follow the
    /// measured indices in order (first index is the highest bit).
    pub probs: Vec<f64>,
    /// `residuals[r]` is the normalized state of the non-measured qubits
    /// after outcome `r`, in their original order.
    pub residuals: Vec<Vec<Complex64>>,
}

/// Build the outcome table for measuring `indices` of `state`: projectors
/// on the indicated qubits, identity on the complement.
pub fn measure_table(state: &[Complex64], indices: &[usize]) -> MeasureTable {
    let n = num_qubits(state);
    let m = indices.len();
    let outcomes = 1usize << m;
    let residual_len = 1usize << (n - m);

    let complement: Vec<usize> = (0..n).filter(|q| !indices.contains(q)).collect();

    let mut probs = vec![0.0; outcomes];
    let mut residuals = vec![vec![Complex64::new(0.0, 0.0); residual_len]; outcomes];

    for (i, amp) in state.iter().enumerate() {
        let mut outcome = 0usize;
        for (k, &q) in indices.iter().enumerate() {
            let bit = (i >> (n - 1 - q)) & 1;
            outcome |= bit << (m - 1 - k);
        }
        let mut residual_index = 0usize;
        for (k, &q) in complement.iter().enumerate() {
            let bit = (i >> (n - 1 - q)) & 1;
            residual_index |= bit << (complement.len() - 1 - k);
        }
        probs[outcome] += amp.norm_sqr();
        residuals[outcome][residual_index] = *amp;
    }

    for (prob, residual) in probs.iter().zip(residuals.iter_mut()) {
        if *prob > 0.0 {
            let norm = prob.sqrt();
            for amp in residual.iter_mut() {
                *amp /= norm;
            }
        }
    }

    MeasureTable { probs, residuals }
}

/// Inverse CDF: the smallest outcome whose cumulative probability strictly
/// exceeds `samp`, clamped to the last outcome.
pub fn sample_outcome(probs: &[f64], samp: f64) -> usize {
    let mut cumulative = 0.0;
    for (outcome, prob) in probs.iter().enumerate() {
        cumulative += prob;
        if samp < cumulative {
            return outcome;
        }
    }
    probs.len().saturating_sub(1)
}
