/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Centroid training for the inverted-file index.

use avs_utils::{Matrix, MatrixView};
use avs_vector::{PureDistanceFunction, distance::SquaredL2};
use hashbrown::HashSet;
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::debug;

use crate::{
    defaults,
    error::{AvsError, AvsErrorKind, AvsResult},
};

/// Partitions a set of vectors into `k` centroids.
///
/// Implementations may be randomized. The returned matrix must have `k` rows with the same
/// width as `data`.
pub trait Clustering {
    fn cluster(&self, data: MatrixView<'_, f32>, k: usize) -> AvsResult<Matrix<f32>>;
}

/// Failures raised while training centroids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusteringError {
    #[error("cannot cluster an empty dataset")]
    EmptyDataset,
    #[error("the number of clusters must be non-zero")]
    ZeroClusters,
    #[error("cannot form {clusters} clusters from {points} points")]
    TooFewPoints { points: usize, clusters: usize },
    #[error("expected a {expected_rows}x{expected_cols} centroid matrix, got {rows}x{cols}")]
    Shape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
}

impl From<ClusteringError> for AvsError {
    #[track_caller]
    fn from(err: ClusteringError) -> Self {
        AvsError::new(AvsErrorKind::ClusteringError, err)
    }
}

/// Lloyd's algorithm seeded with k-means++.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeans {
    /// Upper bound on Lloyd iterations.
    pub max_iterations: usize,

    /// Seed of the pivot sampler.
    pub seed: u64,
}

impl KMeans {
    pub fn new(max_iterations: usize, seed: u64) -> Self {
        Self {
            max_iterations,
            seed,
        }
    }
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(defaults::KMEANS_MAX_ITERATIONS, defaults::KMEANS_SEED)
    }
}

impl Clustering for KMeans {
    fn cluster(&self, data: MatrixView<'_, f32>, k: usize) -> AvsResult<Matrix<f32>> {
        let (points, dim) = (data.nrows(), data.ncols());
        if k == 0 {
            return Err(ClusteringError::ZeroClusters.into());
        }
        if points == 0 {
            return Err(ClusteringError::EmptyDataset.into());
        }
        if points < k {
            return Err(ClusteringError::TooFewPoints {
                points,
                clusters: k,
            }
            .into());
        }

        let mut centers = Matrix::new(0.0f32, k, dim);
        if dim == 0 {
            return Ok(centers);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        select_pivots(data, &mut centers, &mut rng);
        let (residual, iterations) = run_lloyds(data, &mut centers, self.max_iterations);

        debug!(points, k, iterations, residual, "k-means finished");
        Ok(centers)
    }
}

/// Select initial centers with k-means++: points far from the centers chosen so far are
/// more likely to be picked next.
///
/// If the data holds fewer than `k` distinct points, the remaining centers are sampled
/// uniformly.
fn select_pivots(data: MatrixView<'_, f32>, centers: &mut Matrix<f32>, rng: &mut StdRng) {
    let points = data.nrows();
    let k = centers.nrows();

    // Distinct row ids selected as pivots.
    let mut picked = HashSet::with_capacity(k);

    let first = rng.random_range(0..points);
    picked.insert(first);
    centers.row_mut(0).copy_from_slice(data.row(first));

    let mut dist: Vec<f32> = data
        .row_iter()
        .map(|x| SquaredL2::evaluate(x, data.row(first)))
        .collect();

    while picked.len() < k {
        let sum: f64 = dist.iter().map(|&d| d as f64).sum();
        if sum <= 0.0 {
            break;
        }

        let dart = rng.random::<f64>() * sum;
        let mut prefix = 0.0f64;
        let mut chosen = None;
        for (i, &d) in dist.iter().enumerate() {
            prefix += d as f64;
            if d > 0.0 && dart < prefix {
                chosen = Some(i);
                break;
            }
        }

        // Rounding may leave the dart past the final prefix sum.
        let Some(chosen) = chosen.or_else(|| dist.iter().rposition(|&d| d > 0.0)) else {
            break;
        };

        // Selected points sit at distance zero and can not be drawn again.
        let inserted = picked.insert(chosen);
        debug_assert!(inserted, "pivot {chosen} was sampled twice");

        let pivot = data.row(chosen);
        centers.row_mut(picked.len() - 1).copy_from_slice(pivot);
        for (d, x) in dist.iter_mut().zip(data.row_iter()) {
            *d = d.min(SquaredL2::evaluate(x, pivot));
        }
    }

    for c in picked.len()..k {
        let id = rng.random_range(0..points);
        centers.row_mut(c).copy_from_slice(data.row(id));
    }
}

/// Run Lloyd iterations until `max_iterations` or until the relative residual improvement
/// drops below [`defaults::KMEANS_TOLERANCE`].
///
/// Returns the final residual and the number of iterations executed.
fn run_lloyds(
    data: MatrixView<'_, f32>,
    centers: &mut Matrix<f32>,
    max_iterations: usize,
) -> (f32, usize) {
    let mut assignment = vec![0usize; data.nrows()];
    let mut residual = f32::MAX;

    for iteration in 0..max_iterations {
        let previous = residual;
        residual = lloyds_iter(data, centers, &mut assignment);

        if (iteration != 0 && (previous - residual) / residual < defaults::KMEANS_TOLERANCE)
            || residual < f32::EPSILON
        {
            return (residual, iteration + 1);
        }
    }

    (residual, max_iterations)
}

/// One assignment and update step. Returns the residual against the updated centers.
///
/// Centers that lose all their points keep their previous position.
fn lloyds_iter(
    data: MatrixView<'_, f32>,
    centers: &mut Matrix<f32>,
    assignment: &mut [usize],
) -> f32 {
    let dim = data.ncols();
    let k = centers.nrows();

    for (x, a) in data.row_iter().zip(assignment.iter_mut()) {
        *a = closest_center(x, centers.as_view());
    }

    let mut sums = vec![0.0f64; k * dim];
    let mut counts = vec![0usize; k];
    for (x, &a) in data.row_iter().zip(assignment.iter()) {
        counts[a] += 1;
        for (s, &v) in sums[a * dim..(a + 1) * dim].iter_mut().zip(x) {
            *s += v as f64;
        }
    }

    for ((center, sum), &count) in centers
        .row_iter_mut()
        .zip(sums.chunks_exact(dim))
        .zip(counts.iter())
    {
        if count != 0 {
            for (c, s) in center.iter_mut().zip(sum) {
                *c = (s / count as f64) as f32;
            }
        }
    }

    data.row_iter()
        .zip(assignment.iter())
        .map(|(x, &a)| SquaredL2::evaluate(x, centers.row(a)))
        .sum()
}

/// Index of the center nearest `x` in squared L2. Ties go to the lower index.
fn closest_center(x: &[f32], centers: MatrixView<'_, f32>) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, center) in centers.row_iter().enumerate() {
        let d = SquaredL2::evaluate(x, center);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}
