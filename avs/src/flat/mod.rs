/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Exhaustive batched k-nearest-neighbor search.
//!
//! The dataset is streamed through the kernel layer in chunks of at most `batch_size`
//! vectors, so scratch memory stays bounded no matter how large the dataset grows. Every
//! chunk is scored against all queries with one kernel call and the scores are merged into
//! one bounded top-k queue per query.

use avs_utils::{Matrix, MatrixView};
use avs_vector::distance::Metric;
use tracing::debug;

use crate::{
    dataset::Dataset,
    error::{AvsResult, DimensionMismatch},
    kernel::{Kernel, RuntimeContext},
    neighbor::{Neighbor, NeighborPriorityQueue, SearchResult},
};

pub mod config;
pub use config::{Builder, Config, ConfigError};

/// Brute-force index over a growable dataset.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    config: Config,
    ctx: RuntimeContext,
    dataset: Dataset,
}

impl FlatIndex {
    /// Create an empty index that evaluates kernels under `ctx`.
    pub fn new(config: Config, ctx: &RuntimeContext) -> Self {
        Self {
            dataset: Dataset::new(config.dim()),
            config,
            ctx: *ctx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Append `vector`, returning its id.
    ///
    /// Fails with [`crate::AvsErrorKind::DimensionMismatch`] and leaves the index unchanged
    /// if the vector length differs from the configured dimension.
    pub fn add(&mut self, vector: &[f32]) -> AvsResult<u32> {
        Ok(self.dataset.push(vector)?)
    }

    /// Append every row of `vectors`, returning the id of the first.
    ///
    /// Either all rows are added or, on a dimension mismatch, none are.
    pub fn extend(&mut self, vectors: MatrixView<'_, f32>) -> AvsResult<u32> {
        Ok(self.dataset.extend(vectors)?)
    }

    /// Return `(count, dim)`. The dimension is reported as 0 while the index is empty.
    pub fn shape(&self) -> (usize, usize) {
        if self.dataset.is_empty() {
            (0, 0)
        } else {
            (self.dataset.len(), self.dataset.dim())
        }
    }

    /// Return the `k` best dataset vectors for every row of `queries`, best first.
    ///
    /// Each result list holds `min(k, shape().0)` entries. An empty index yields one empty
    /// list per query. Ties are broken in favor of the smaller id. A `NaN` score, such as an
    /// inner product that overflows, ranks after every number.
    ///
    /// # Errors
    ///
    /// * [`crate::AvsErrorKind::DimensionMismatch`] if `queries` has the wrong width.
    /// * [`crate::AvsErrorKind::UnsupportedHardware`] if the configured path cannot run.
    pub fn search(
        &self,
        queries: MatrixView<'_, f32>,
        k: usize,
    ) -> AvsResult<Vec<Vec<SearchResult>>> {
        let dim = self.config.dim();
        if queries.ncols() != dim {
            return Err(DimensionMismatch {
                expected: dim,
                got: queries.ncols(),
            }
            .into());
        }

        let metric = self.config.metric();
        let kernel = Kernel::new(metric, self.config.path());
        self.ctx.require(kernel.path)?;

        let mut queues: Vec<_> = (0..queries.nrows())
            .map(|_| NeighborPriorityQueue::new(k))
            .collect();

        if k != 0 {
            let batch_size = self.config.batch_size().get();
            let mut base: u32 = 0;
            for chunk in self.dataset.as_view().window_iter(batch_size) {
                let scores = kernel.compute_at(&self.ctx, queries, chunk, base as usize)?;
                merge(metric, base, &scores, &mut queues);
                base += chunk.nrows() as u32;
            }
            debug!(
                queries = queries.nrows(),
                candidates = base,
                batch_size,
                "flat search complete"
            );
        }

        Ok(queues
            .iter_mut()
            .map(|queue| queue.drain_results(metric))
            .collect())
    }

    /// Search for a single query. See [`FlatIndex::search`].
    pub fn search_one(&self, query: &[f32], k: usize) -> AvsResult<Vec<SearchResult>> {
        let queries = MatrixView::from_parts(query, 1, query.len());
        let mut results = self.search(queries, k)?;
        Ok(results.pop().unwrap_or_default())
    }
}

/// Push every score of `scores` into the queue of its query row. Column `j` corresponds to
/// candidate id `base + j`.
pub(crate) fn merge(
    metric: Metric,
    base: u32,
    scores: &Matrix<f32>,
    queues: &mut [NeighborPriorityQueue],
) {
    for (row, queue) in scores.row_iter().zip(queues.iter_mut()) {
        for (offset, &score) in row.iter().enumerate() {
            queue.insert(Neighbor::new(base + offset as u32, metric.to_distance(score)));
        }
    }
}
