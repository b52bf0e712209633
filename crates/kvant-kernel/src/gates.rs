//! Statevector gate arithmetic.
//!
//! Qubit `i` addresses the `i`-th highest-order bit of the basis index, so
//! a compound state built by [`kron`] keeps earlier factors in the high
//! bits. The measurement routines share this big-endian convention.

use num_complex::Complex64;

use std::f64::consts::FRAC_1_SQRT_2;

/// Number of qubits represented by `state` (its length is `2^n`).
pub fn num_qubits(state: &[Complex64]) -> usize {
    debug_assert!(state.len().is_power_of_two());
    state.len().trailing_zeros() as usize
}

fn bit_mask(n: usize, qubit: usize) -> usize {
    1 << (n - 1 - qubit)
}

/// Kronecker product with `c[k] = a[k / b.len()] * b[k % b.len()]`.
pub fn kron(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for x in a {
        for y in b {
            out.push(x * y);
        }
    }
    out
}

/// Hadamard on `qubit`.
pub fn hadamard(state: &[Complex64], qubit: usize) -> Vec<Complex64> {
    let mask = bit_mask(num_qubits(state), qubit);
    let mut out = state.to_vec();
    for i in 0..out.len() {
        if i & mask == 0 {
            let j = i | mask;
            let a = out[i];
            let b = out[j];
            out[i] = FRAC_1_SQRT_2 * (a + b);
            out[j] = FRAC_1_SQRT_2 * (a - b);
        }
    }
    out
}

/// Pauli-X on `qubit`.
pub fn pauli_x(state: &[Complex64], qubit: usize) -> Vec<Complex64> {
    let mask = bit_mask(num_qubits(state), qubit);
    let mut out = state.to_vec();
    for i in 0..out.len() {
        if i & mask == 0 {
            out.swap(i, i | mask);
        }
    }
    out
}

/// Pauli-Y on `qubit`.
pub fn pauli_y(state: &[Complex64], qubit: usize) -> Vec<Complex64> {
    let mask = bit_mask(num_qubits(state), qubit);
    let im = Complex64::new(0.0, 1.0);
    let mut out = state.to_vec();
    for i in 0..out.len() {
        if i & mask == 0 {
            let j = i | mask;
            let tmp = out[i];
            out[i] = -im * out[j];
            out[j] = im * tmp;
        }
    }
    out
}

/// Pauli-Z on `qubit`.
pub fn pauli_z(state: &[Complex64], qubit: usize) -> Vec<Complex64> {
    let mask = bit_mask(num_qubits(state), qubit);
    let mut out = state.to_vec();
    for (i, amp) in out.iter_mut().enumerate() {
        if i & mask != 0 {
            *amp = -*amp;
        }
    }
    out
}

/// Controlled-X with `control` and `target`.
pub fn cnot(state: &[Complex64], control: usize, target: usize) -> Vec<Complex64> {
    let n = num_qubits(state);
    let ctrl_mask = bit_mask(n, control);
    let tgt_mask = bit_mask(n, target);
    let mut out = state.to_vec();
    for i in 0..out.len() {
        if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
            out.swap(i, i | tgt_mask);
        }
    }
    out
}

/// Exchange of qubits `q1` and `q2`.
pub fn swap(state: &[Complex64], q1: usize, q2: usize) -> Vec<Complex64> {
    let n = num_qubits(state);
    let mask1 = bit_mask(n, q1);
    let mask2 = bit_mask(n, q2);
    let mut out = state.to_vec();
    for i in 0..out.len() {
        if (i & mask1 != 0) && (i & mask2 == 0) {
            out.swap(i, (i & !mask1) | mask2);
        }
    }
    out
}
