/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use faer::{self, Par};

use super::common::{Parallelism, Transpose};

fn to_par(parallelism: Parallelism) -> Par {
    match parallelism {
        Parallelism::Sequential => Par::Seq,
        Parallelism::Threads(n) => Par::rayon(n.get()),
    }
}

/// Overwrite `c` with `a * b` (or `a * b'`). See the documentation for `bf16_gemm`.
///
/// The implementation may assume the the specified invariants hold for the sizes of the
/// intermediate arrays.
#[allow(clippy::too_many_arguments)]
pub(super) fn gemm_impl(
    parallelism: Parallelism,
    btranspose: Transpose,
    m: usize,
    n: usize,
    k: usize,
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
) {
    let a = faer::mat::MatRef::from_row_major_slice(a, m, k);
    let b = btranspose.call(
        || faer::mat::MatRef::from_row_major_slice(b, k, n),
        || faer::mat::MatRef::from_row_major_slice(b, n, k).transpose(),
    );
    let c = faer::mat::MatMut::from_row_major_slice_mut(c, m, n);

    faer::linalg::matmul::matmul(c, faer::Accum::Replace, a, b, 1.0, to_par(parallelism))
}
