/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use super::common::Transpose;

/// Triple-loop GEMM used as ground truth for the optimized path.
pub(crate) fn gemm_impl(
    btranspose: Transpose,
    m: usize,
    n: usize,
    k: usize,
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
) {
    for i in 0..m {
        for j in 0..n {
            let mut temp = 0.0;
            for l in 0..k {
                let b_val = btranspose.call(|| b[l * n + j], || b[j * k + l]);
                temp += a[i * k + l] * b_val;
            }
            c[i * n + j] = temp;
        }
    }
}

/// A hand-checked product used to exercise both layouts of `b`.
///
/// ```text
///       A (2x4)         B (4x3)        A * B
///   7  1  6  8       1  9  6        83 150 113
///   6  2  6  1       8  7  5        62  99  70
///                    6  4  3
///                    4  7  6
/// ```
pub(crate) struct SmallProblem {
    pub(crate) m: usize,
    pub(crate) n: usize,
    pub(crate) k: usize,
    a: Vec<f32>,
    b: Vec<f32>,
    bt: Vec<f32>,
    ab: Vec<f32>,
}

impl SmallProblem {
    pub(crate) fn new() -> Self {
        Self {
            m: 2,
            n: 3,
            k: 4,
            a: vec![7.0, 1.0, 6.0, 8.0, 6.0, 2.0, 6.0, 1.0],
            b: vec![1.0, 9.0, 6.0, 8.0, 7.0, 5.0, 6.0, 4.0, 3.0, 4.0, 7.0, 6.0],
            bt: vec![1.0, 8.0, 6.0, 4.0, 9.0, 7.0, 4.0, 7.0, 6.0, 5.0, 3.0, 6.0],
            ab: vec![83.0, 150.0, 113.0, 62.0, 99.0, 70.0],
        }
    }

    pub(crate) fn a(&self) -> &[f32] {
        &self.a
    }

    /// The `b` operand laid out according to `transpose`.
    pub(crate) fn b(&self, transpose: Transpose) -> &[f32] {
        transpose.call(|| &self.b, || &self.bt)
    }

    /// The expected value of `a * b`.
    pub(crate) fn expected(&self) -> Vec<f32> {
        self.ab.clone()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_reference_implementation(
        #[values(Transpose::None, Transpose::Ordinary)] btranspose: Transpose,
    ) {
        let problem = SmallProblem::new();
        let mut c = vec![0.0; problem.m * problem.n];
        gemm_impl(
            btranspose,
            problem.m,
            problem.n,
            problem.k,
            problem.a(),
            problem.b(btranspose),
            &mut c,
        );
        assert_eq!(c, problem.expected());
    }
}
