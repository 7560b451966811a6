/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use avs_utils::{Matrix, views::Init};
use rand::{Rng, SeedableRng, distr::StandardUniform, rngs::StdRng};

/// Generate an `nrows x ncols` matrix with entries drawn uniformly from `[0, 1)`.
pub fn random_matrix<R: Rng>(rng: &mut R, nrows: usize, ncols: usize) -> Matrix<f32> {
    Matrix::new(Init(|| rng.sample(StandardUniform)), nrows, ncols)
}

/// Generate a dataset and a query batch of dimension `dim` from a single seed.
///
/// The dataset is drawn first, so a given seed always produces the same dataset regardless
/// of how many queries are requested.
pub fn random_workload(seed: u64, dim: usize, nd: usize, nq: usize) -> (Matrix<f32>, Matrix<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = random_matrix(&mut rng, nd, dim);
    let queries = random_matrix(&mut rng, nq, dim);
    (data, queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_unit_interval() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = random_matrix(&mut rng, 50, 7);
        assert_eq!(m.nrows(), 50);
        assert_eq!(m.ncols(), 7);
        assert!(m.as_slice().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn workload_is_seeded() {
        let (d0, q0) = random_workload(47, 4, 20, 5);
        let (d1, q1) = random_workload(47, 4, 20, 5);
        assert_eq!(d0.as_slice(), d1.as_slice());
        assert_eq!(q0.as_slice(), q1.as_slice());

        let (d2, _) = random_workload(47, 4, 20, 9);
        assert_eq!(d0.as_slice(), d2.as_slice());

        let (d3, _) = random_workload(48, 4, 20, 5);
        assert_ne!(d0.as_slice(), d3.as_slice());
    }

    #[test]
    fn empty_shapes() {
        let (d, q) = random_workload(1, 8, 0, 0);
        assert_eq!(d.nrows(), 0);
        assert_eq!(q.nrows(), 0);
        assert_eq!(d.ncols(), 8);
    }
}
