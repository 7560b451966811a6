/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Batched distance kernels.
//!
//! A [`Kernel`] pairs a [`Metric`] with an [`ExecutionPath`] and turns a batch of queries and
//! a batch of candidates into a dense score matrix. Entry `(i, j)` holds the metric's natural
//! score between query `i` and candidate `j`: squared L2 distance or inner product.

use std::{fmt, str::FromStr};

use avs_utils::{Matrix, MatrixView};
use avs_vector::{Capability, distance::Metric};
use thiserror::Error;

use crate::error::{AvsResult, ShapeMismatch};

mod context;
pub use context::RuntimeContext;

mod tile;

///////////////////
// ExecutionPath //
///////////////////

/// The numeric back end used to evaluate a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPath {
    /// Straight loops. The reference for every other path.
    Scalar,
    /// 16-lane fused multiply-add accumulation.
    Simd,
    /// Distances re-expressed as a reduced-precision (bf16) matrix multiply.
    Tile,
}

impl ExecutionPath {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Simd => "simd",
            Self::Tile => "tile",
        }
    }

    /// The capability a [`RuntimeContext`] must offer for this path.
    ///
    /// The SIMD path falls back to a portable rendition and is never rejected.
    pub const fn required_capability(self) -> Capability {
        match self {
            Self::Scalar | Self::Simd => Capability::Scalar,
            Self::Tile => Capability::TileAccelAvailable,
        }
    }
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name an [`ExecutionPath`].
#[derive(Debug, Error)]
pub enum ParseExecutionPathError {
    #[error("Invalid format for ExecutionPath: {0}")]
    InvalidFormat(String),
}

impl FromStr for ExecutionPath {
    type Err = ParseExecutionPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scalar" => Ok(Self::Scalar),
            "simd" => Ok(Self::Simd),
            "tile" => Ok(Self::Tile),
            _ => Err(ParseExecutionPathError::InvalidFormat(String::from(s))),
        }
    }
}

////////////
// Kernel //
////////////

/// One of the fixed set of distance kernels, selected by metric and execution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub metric: Metric,
    pub path: ExecutionPath,
}

impl Kernel {
    pub fn new(metric: Metric, path: ExecutionPath) -> Self {
        Self { metric, path }
    }

    /// Compute the `queries.nrows() x candidates.nrows()` score matrix.
    ///
    /// Equivalent to [`Kernel::compute_at`] with an offset of zero.
    pub fn compute(
        &self,
        ctx: &RuntimeContext,
        queries: MatrixView<'_, f32>,
        candidates: MatrixView<'_, f32>,
    ) -> AvsResult<Matrix<f32>> {
        self.compute_at(ctx, queries, candidates, 0)
    }

    /// Compute the score matrix for a batch of candidates whose first row sits at absolute
    /// position `offset` in a larger candidate set.
    ///
    /// Scores never depend on how the candidate set is split into batches as long as each
    /// batch is passed with its own offset. The tile path uses the offset to align its
    /// products; the other paths score each pair independently and ignore it.
    ///
    /// An empty candidate batch yields a matrix with no columns.
    ///
    /// # Errors
    ///
    /// * [`crate::AvsErrorKind::UnsupportedHardware`] if `ctx` cannot run `self.path`. No
    ///   fallback to another path is attempted.
    /// * [`crate::AvsErrorKind::ShapeMismatch`] if the two batches disagree on dimension.
    pub fn compute_at(
        &self,
        ctx: &RuntimeContext,
        queries: MatrixView<'_, f32>,
        candidates: MatrixView<'_, f32>,
        offset: usize,
    ) -> AvsResult<Matrix<f32>> {
        ctx.require(self.path)?;

        let (nq, nc) = (queries.nrows(), candidates.nrows());
        if nc == 0 {
            return Ok(Matrix::new(0.0, nq, 0));
        }

        if queries.ncols() != candidates.ncols() {
            return Err(ShapeMismatch {
                left: queries.ncols(),
                right: candidates.ncols(),
            }
            .into());
        }

        let mut out = Matrix::new(0.0, nq, nc);
        if nq == 0 || queries.ncols() == 0 {
            return Ok(out);
        }

        match (self.path, self.metric) {
            (ExecutionPath::Scalar, metric) => {
                pairwise(metric.scalar_kernel(), queries, candidates, &mut out)
            }
            (ExecutionPath::Simd, metric) => {
                pairwise(metric.simd_kernel(), queries, candidates, &mut out)
            }
            (ExecutionPath::Tile, Metric::L2) => {
                tile::squared_l2(ctx, queries, candidates, offset, &mut out)
            }
            (ExecutionPath::Tile, Metric::InnerProduct) => {
                tile::inner_product(ctx, queries, candidates, offset, &mut out)
            }
        }

        Ok(out)
    }
}

fn pairwise(
    f: fn(&[f32], &[f32]) -> f32,
    queries: MatrixView<'_, f32>,
    candidates: MatrixView<'_, f32>,
    out: &mut Matrix<f32>,
) {
    for (query, scores) in queries.row_iter().zip(out.row_iter_mut()) {
        for (candidate, score) in candidates.row_iter().zip(scores.iter_mut()) {
            *score = f(query, candidate);
        }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rstest::rstest;

    use super::*;
    use crate::AvsErrorKind;

    const ALL_PATHS: [ExecutionPath; 3] =
        [ExecutionPath::Scalar, ExecutionPath::Simd, ExecutionPath::Tile];

    fn tile_ctx() -> RuntimeContext {
        RuntimeContext::with_capability(Capability::TileAccelAvailable)
    }

    fn random_matrix(rng: &mut StdRng, nrows: usize, ncols: usize) -> Matrix<f32> {
        Matrix::new(avs_utils::views::Init(|| rng.random::<f32>()), nrows, ncols)
    }

    #[test]
    fn test_execution_path_from_str() {
        for path in ALL_PATHS {
            assert_eq!(path.to_string().parse::<ExecutionPath>().unwrap(), path);
        }
        assert_eq!("SIMD".parse::<ExecutionPath>().unwrap(), ExecutionPath::Simd);
        assert_eq!(
            "gpu".parse::<ExecutionPath>().unwrap_err().to_string(),
            "Invalid format for ExecutionPath: gpu"
        );
    }

    #[rstest]
    fn small_known_values(
        #[values(ExecutionPath::Scalar, ExecutionPath::Simd, ExecutionPath::Tile)]
        path: ExecutionPath,
    ) {
        // All entries are small integers, exact in bf16.
        let queries = Matrix::from_vec(vec![1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0], 2, 4).unwrap();
        let candidates =
            Matrix::from_vec(vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3, 4)
                .unwrap();

        let l2 = Kernel::new(Metric::L2, path)
            .compute(&tile_ctx(), queries.as_view(), candidates.as_view())
            .unwrap();
        assert_eq!(l2.as_slice(), &[0.0, 2.0, 2.0, 29.0, 27.0, 25.0]);

        let ip = Kernel::new(Metric::InnerProduct, path)
            .compute(&tile_ctx(), queries.as_view(), candidates.as_view())
            .unwrap();
        assert_eq!(ip.as_slice(), &[1.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[rstest]
    fn paths_agree_with_scalar(
        #[values(Metric::L2, Metric::InnerProduct)] metric: Metric,
        #[values(1, 15, 16, 17, 64, 100)] dim: usize,
    ) {
        let mut rng = StdRng::seed_from_u64(0x1234 + dim as u64);
        let queries = random_matrix(&mut rng, 3, dim);
        // Exceed one Gram tile so the tiled L2 path stitches several blocks.
        let candidates = random_matrix(&mut rng, 300, dim);

        let ctx = tile_ctx();
        let reference = Kernel::new(metric, ExecutionPath::Scalar)
            .compute(&ctx, queries.as_view(), candidates.as_view())
            .unwrap();
        let simd = Kernel::new(metric, ExecutionPath::Simd)
            .compute(&ctx, queries.as_view(), candidates.as_view())
            .unwrap();
        let tile = Kernel::new(metric, ExecutionPath::Tile)
            .compute(&ctx, queries.as_view(), candidates.as_view())
            .unwrap();

        for ((r, s), t) in reference
            .as_slice()
            .iter()
            .zip(simd.as_slice())
            .zip(tile.as_slice())
        {
            assert_relative_eq!(*s, *r, epsilon = 1e-5, max_relative = 1e-4);
            assert_relative_eq!(*t, *r, epsilon = 1e-3, max_relative = 2e-2);
        }
    }

    #[rstest]
    fn batched_scores_match_whole(
        #[values(Metric::L2, Metric::InnerProduct)] metric: Metric,
        #[values(ExecutionPath::Scalar, ExecutionPath::Simd, ExecutionPath::Tile)]
        path: ExecutionPath,
    ) {
        let mut rng = StdRng::seed_from_u64(0xc4a1);
        let queries = random_matrix(&mut rng, 4, 37);
        let candidates = random_matrix(&mut rng, 300, 37);

        let ctx = tile_ctx();
        let kernel = Kernel::new(metric, path);
        let whole = kernel
            .compute(&ctx, queries.as_view(), candidates.as_view())
            .unwrap();

        for batch in [1, 3, 17, 128, 129, 300] {
            let mut start = 0;
            for chunk in candidates.window_iter(batch) {
                let scores = kernel
                    .compute_at(&ctx, queries.as_view(), chunk, start)
                    .unwrap();
                for (got, expected) in scores.row_iter().zip(whole.row_iter()) {
                    // Bitwise equality: the batch split must not perturb a single score.
                    assert_eq!(
                        got,
                        &expected[start..start + chunk.nrows()],
                        "batch = {batch}, start = {start}"
                    );
                }
                start += chunk.nrows();
            }
        }
    }

    #[rstest]
    fn empty_candidates_give_empty_matrix(
        #[values(ExecutionPath::Scalar, ExecutionPath::Simd, ExecutionPath::Tile)]
        path: ExecutionPath,
    ) {
        let queries = Matrix::new(1.0f32, 2, 8);
        let candidates = Matrix::new(0.0f32, 0, 8);
        let out = Kernel::new(Metric::L2, path)
            .compute(&tile_ctx(), queries.as_view(), candidates.as_view())
            .unwrap();
        assert_eq!(out.nrows(), 2);
        assert_eq!(out.ncols(), 0);
    }

    #[test]
    fn shape_mismatch() {
        let queries = Matrix::new(1.0f32, 2, 8);
        let candidates = Matrix::new(0.0f32, 3, 7);
        for path in ALL_PATHS {
            let err = Kernel::new(Metric::InnerProduct, path)
                .compute(&tile_ctx(), queries.as_view(), candidates.as_view())
                .unwrap_err();
            assert_eq!(err.kind(), AvsErrorKind::ShapeMismatch);
            assert_eq!(
                err.downcast_ref::<ShapeMismatch>(),
                Some(&ShapeMismatch { left: 8, right: 7 })
            );
        }
    }

    #[test]
    fn tile_requires_capability() {
        let queries = Matrix::new(1.0f32, 1, 4);
        for capability in [Capability::Scalar, Capability::SimdAvailable] {
            let ctx = RuntimeContext::with_capability(capability);
            let err = Kernel::new(Metric::L2, ExecutionPath::Tile)
                .compute(&ctx, queries.as_view(), queries.as_view())
                .unwrap_err();
            assert_eq!(err.kind(), AvsErrorKind::UnsupportedHardware);

            // Other paths still work on the same context.
            let out = Kernel::new(Metric::L2, ExecutionPath::Simd)
                .compute(&ctx, queries.as_view(), queries.as_view())
                .unwrap();
            assert_eq!(out.as_slice(), &[0.0]);
        }
    }
}
