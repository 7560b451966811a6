/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Dense matrix products for the accelerated search kernels.
//!
//! All matrices are implicitly row-major and dense. The single entry point, [`bf16_gemm`],
//! multiplies operands that have already been rounded to `bf16`. This is the shape of work
//! issued to matrix-multiply tile hardware: reduced precision inputs and `f32` accumulation.

pub mod common;
pub use common::{Parallelism, Transpose};

mod faer;
use faer::gemm_impl;
use half::bf16;

// Make the reference implementation available for internal testing.
#[cfg(test)]
mod reference;

/// Compute `c = a * b` (or `c = a * b'` when `btranspose` is `Ordinary`) for operands
/// stored in `bf16`, writing `f32` results.
///
/// * `m`: The number of rows in `a` and `c`.
/// * `n`: The number of columns in `c`.
/// * `k`: The inner dimension. This is the number of columns of `a`. If
///   `!btranspose.is_transpose()` it is the number of rows in `b`, otherwise the number of
///   columns.
///
/// The operands are widened exactly to `f32` and multiplied with `f32` accumulation, so
/// the only precision lost is whatever was lost when the caller rounded its inputs to
/// `bf16`. `c` is overwritten entirely.
///
/// # Panics
///
/// Panics if
/// * `a.len() != m * k`
/// * `b.len() != k * n`
/// * `c.len() != m * n`.
#[allow(clippy::too_many_arguments)]
pub fn bf16_gemm(
    parallelism: Parallelism,
    btranspose: Transpose,
    m: usize,
    n: usize,
    k: usize,
    a: &[bf16],
    b: &[bf16],
    c: &mut [f32],
) {
    check_sizes(m, n, k, a.len(), b.len(), c.len());

    let a: Vec<f32> = a.iter().map(|x| x.to_f32()).collect();
    let b: Vec<f32> = b.iter().map(|x| x.to_f32()).collect();

    gemm_impl(parallelism, btranspose, m, n, k, &a, &b, c)
}

fn check_sizes(m: usize, n: usize, k: usize, alen: usize, blen: usize, clen: usize) {
    assert_eq!(
        alen,
        m * k,
        "expected {}x{} matrix `a` to have length {}, instead got {}",
        m,
        k,
        m * k,
        alen
    );
    assert_eq!(
        blen,
        k * n,
        "expected {}x{} matrix `b` to have length {}, instead got {}",
        k,
        n,
        k * n,
        blen
    );
    assert_eq!(
        clen,
        m * n,
        "expected {}x{} matrix `c` to have length {}, instead got {}",
        m,
        n,
        m * n,
        clen
    );
}
