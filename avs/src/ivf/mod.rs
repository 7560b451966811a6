/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Inverted-file approximate search.
//!
//! Training partitions the data into `n_list` clusters and records, for each centroid, the
//! ids of the vectors nearest to it. A search scores every query against the centroids,
//! visits the `n_probe` best ones and ranks only their members.
//!
//! Centroid selection follows the configured metric: the smallest distance for L2 and the
//! largest inner product for [`Metric::InnerProduct`]. Ties go to the lower centroid index.

use avs_utils::{Matrix, MatrixView};
use avs_vector::distance::Metric;
use tracing::{debug, info};

use crate::{
    dataset::Dataset,
    error::{AlreadyTrained, AvsResult, DimensionMismatch, ErrorContext, NotTrained},
    kernel::{Kernel, RuntimeContext},
    kmeans::{Clustering, ClusteringError},
    neighbor::{Neighbor, NeighborPriorityQueue, SearchResult},
};

pub mod config;
pub use config::{Builder, Config, ConfigError};

mod inverted_lists;
pub use inverted_lists::InvertedLists;

/// An inverted-file index. Starts untrained and becomes searchable after one successful
/// [`IvfIndex::train`].
#[derive(Debug, Clone)]
pub struct IvfIndex {
    config: Config,
    ctx: RuntimeContext,
    state: State,
}

#[derive(Debug, Clone)]
enum State {
    Untrained,
    Trained(Trained),
}

#[derive(Debug, Clone)]
struct Trained {
    /// Copy of the training data. Ids are row positions.
    dataset: Dataset,
    centroids: Matrix<f32>,
    lists: InvertedLists,
}

impl IvfIndex {
    /// Create an untrained index that evaluates kernels under `ctx`.
    pub fn new(config: Config, ctx: &RuntimeContext) -> Self {
        Self {
            config,
            ctx: *ctx,
            state: State::Untrained,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, State::Trained(_))
    }

    /// The trained centroids, one per row, or `None` before training.
    pub fn centroids(&self) -> Option<MatrixView<'_, f32>> {
        self.trained().map(|t| t.centroids.as_view())
    }

    /// The centroid-to-members mapping, or `None` before training.
    pub fn inverted_lists(&self) -> Option<&InvertedLists> {
        self.trained().map(|t| &t.lists)
    }

    /// The vectors retained at training time, or `None` before training.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.trained().map(|t| &t.dataset)
    }

    /// Train with the k-means configured in [`Config::kmeans`].
    ///
    /// See [`IvfIndex::train_with`].
    pub fn train(&mut self, data: MatrixView<'_, f32>) -> AvsResult<()> {
        let kmeans = self.config.kmeans();
        self.train_with(data, &kmeans)
    }

    /// Obtain `n_list` centroids from `clustering`, assign every row of `data` to its best
    /// centroid and retain a copy of `data` for search. Row `i` of `data` gets id `i`.
    ///
    /// On any error the index stays untrained.
    ///
    /// # Errors
    ///
    /// * [`crate::AvsErrorKind::AlreadyTrained`] if the index was trained before.
    /// * [`crate::AvsErrorKind::DimensionMismatch`] if `data` has the wrong width.
    /// * [`crate::AvsErrorKind::ClusteringError`] if clustering fails or returns centroids
    ///   of the wrong shape.
    /// * [`crate::AvsErrorKind::UnsupportedHardware`] if the configured path cannot run.
    pub fn train_with<C>(&mut self, data: MatrixView<'_, f32>, clustering: &C) -> AvsResult<()>
    where
        C: Clustering + ?Sized,
    {
        if self.is_trained() {
            return Err(AlreadyTrained.into());
        }

        let dim = self.config.dim();
        if data.ncols() != dim {
            return Err(DimensionMismatch {
                expected: dim,
                got: data.ncols(),
            }
            .into());
        }

        let kernel = self.kernel();
        self.ctx.require(kernel.path)?;

        let n_list = self.config.n_list();
        let centroids = clustering
            .cluster(data, n_list)
            .context("while training ivf centroids")?;
        if centroids.nrows() != n_list || centroids.ncols() != dim {
            return Err(ClusteringError::Shape {
                expected_rows: n_list,
                expected_cols: dim,
                rows: centroids.nrows(),
                cols: centroids.ncols(),
            }
            .into());
        }

        let assignment = self.assign(kernel, data, centroids.as_view())?;
        let lists = InvertedLists::from_assignment(n_list, &assignment);

        info!(
            points = data.nrows(),
            n_list,
            occupied = lists.num_occupied(),
            largest = lists.iter().map(<[u32]>::len).max().unwrap_or(0),
            "ivf training complete"
        );

        self.state = State::Trained(Trained {
            dataset: Dataset::from_view(data),
            centroids,
            lists,
        });
        Ok(())
    }

    /// Return the `top_k` best retained vectors for every row of `queries`, best first.
    ///
    /// Only members of the `n_probe` best centroids of each query are ranked. Ties are
    /// broken in favor of the smaller id, and `NaN` scores rank after every number.
    ///
    /// # Errors
    ///
    /// * [`crate::AvsErrorKind::NotTrained`] if the index has not been trained.
    /// * [`crate::AvsErrorKind::DimensionMismatch`] if `queries` has the wrong width.
    /// * [`crate::AvsErrorKind::UnsupportedHardware`] if the configured path cannot run.
    pub fn search(
        &self,
        queries: MatrixView<'_, f32>,
        top_k: usize,
    ) -> AvsResult<Vec<Vec<SearchResult>>> {
        let trained = self.trained().ok_or(NotTrained)?;

        let dim = self.config.dim();
        if queries.ncols() != dim {
            return Err(DimensionMismatch {
                expected: dim,
                got: queries.ncols(),
            }
            .into());
        }

        let kernel = self.kernel();
        self.ctx.require(kernel.path)?;

        let metric = self.config.metric();
        let batch_size = self.config.batch_size().get();
        let centroid_scores = kernel.compute(&self.ctx, queries, trained.centroids.as_view())?;

        let mut results = Vec::with_capacity(queries.nrows());
        let mut candidates: Vec<u32> = Vec::new();
        let mut scored = 0;
        for (query, scores) in queries.row_iter().zip(centroid_scores.row_iter()) {
            candidates.clear();
            for list in self.nearest_lists(scores).iter() {
                candidates.extend_from_slice(trained.lists.get(list.id as usize));
            }
            // First-seen wins ties in the queue, so smaller ids must come first.
            candidates.sort_unstable();

            let mut queue = NeighborPriorityQueue::new(top_k);
            if top_k != 0 {
                let query = MatrixView::from_parts(query, 1, dim);
                for (chunk, ids) in candidates.chunks(batch_size).enumerate() {
                    let members = trained.dataset.gather(ids);
                    let scores = kernel.compute_at(
                        &self.ctx,
                        query,
                        members.as_view(),
                        chunk * batch_size,
                    )?;
                    for (&id, &score) in ids.iter().zip(scores.row(0)) {
                        queue.insert(Neighbor::new(id, metric.to_distance(score)));
                    }
                }
                scored += candidates.len();
            }
            results.push(queue.drain_results(metric));
        }

        debug!(
            queries = queries.nrows(),
            n_probe = self.config.n_probe(),
            scored,
            "ivf search complete"
        );
        Ok(results)
    }

    fn trained(&self) -> Option<&Trained> {
        match &self.state {
            State::Trained(trained) => Some(trained),
            State::Untrained => None,
        }
    }

    fn kernel(&self) -> Kernel {
        Kernel::new(self.config.metric(), self.config.path())
    }

    /// The `n_probe` best centroids for one row of centroid scores.
    fn nearest_lists(&self, scores: &[f32]) -> NeighborPriorityQueue {
        let metric = self.config.metric();
        let mut lists = NeighborPriorityQueue::new(self.config.n_probe());
        for (centroid, &score) in scores.iter().enumerate() {
            lists.insert(Neighbor::new(centroid as u32, metric.to_distance(score)));
        }
        lists
    }

    /// Index of the best centroid for every row of `data`.
    fn assign(
        &self,
        kernel: Kernel,
        data: MatrixView<'_, f32>,
        centroids: MatrixView<'_, f32>,
    ) -> AvsResult<Vec<u32>> {
        let mut assignment = Vec::with_capacity(data.nrows());
        for chunk in data.window_iter(self.config.batch_size().get()) {
            let scores = kernel.compute(&self.ctx, chunk, centroids)?;
            assignment.extend(scores.row_iter().map(|row| best_centroid(kernel.metric, row)));
        }
        Ok(assignment)
    }
}

/// Position of the best score in `scores` under `metric`. The first of equal scores wins.
fn best_centroid(metric: Metric, scores: &[f32]) -> u32 {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if metric.is_better(score, scores[best]) {
            best = i;
        }
    }
    best as u32
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use avs_vector::Capability;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rstest::rstest;

    use super::*;
    use crate::{
        AvsErrorKind,
        flat::{self, FlatIndex},
        kernel::ExecutionPath,
    };

    /// Hands back a fixed set of centroids.
    struct Fixed(Matrix<f32>);

    impl Clustering for Fixed {
        fn cluster(&self, _data: MatrixView<'_, f32>, _k: usize) -> AvsResult<Matrix<f32>> {
            Ok(self.0.to_owned())
        }
    }

    fn ctx() -> RuntimeContext {
        RuntimeContext::with_capability(Capability::TileAccelAvailable)
    }

    fn random_matrix(rng: &mut StdRng, nrows: usize, ncols: usize) -> Matrix<f32> {
        Matrix::new(avs_utils::views::Init(|| rng.random::<f32>()), nrows, ncols)
    }

    #[test]
    fn best_centroid_follows_metric() {
        let scores = [3.0, 1.0, 5.0, 1.0, 5.0];
        assert_eq!(best_centroid(Metric::L2, &scores), 1);
        assert_eq!(best_centroid(Metric::InnerProduct, &scores), 2);
    }

    #[rstest]
    #[case(Metric::L2, [0, 1, 0])]
    #[case(Metric::InnerProduct, [1, 1, 0])]
    fn assignment_follows_metric(#[case] metric: Metric, #[case] expected: [u32; 3]) {
        let centroids = Matrix::from_vec(vec![1.0, 0.0, 3.0, 0.0], 2, 2).unwrap();
        let data = Matrix::from_vec(vec![1.0, 0.0, 2.5, 0.0, -1.0, 0.0], 3, 2).unwrap();

        let config = Builder::new(2, 2, metric).build().unwrap();
        let mut index = IvfIndex::new(config, &ctx());
        index.train_with(data.as_view(), &Fixed(centroids)).unwrap();

        let lists = index.inverted_lists().unwrap();
        for (id, &centroid) in expected.iter().enumerate() {
            assert!(lists.get(centroid as usize).contains(&(id as u32)));
        }
    }

    #[test]
    fn state_machine() {
        let _guard = crate::tracing::init_test_subscriber();
        let mut rng = StdRng::seed_from_u64(0xf00d);
        let data = random_matrix(&mut rng, 50, 4);

        let config = Builder::new(4, 3, Metric::L2).build().unwrap();
        let mut index = IvfIndex::new(config, &ctx());
        assert!(!index.is_trained());
        assert!(index.centroids().is_none());
        assert!(index.inverted_lists().is_none());

        let err = index.search(data.as_view(), 1).unwrap_err();
        assert_eq!(err.kind(), AvsErrorKind::NotTrained);

        index.train(data.as_view()).unwrap();
        assert!(index.is_trained());
        assert_eq!(index.centroids().unwrap().nrows(), 3);
        assert_eq!(index.dataset().unwrap().len(), 50);

        let err = index.train(data.as_view()).unwrap_err();
        assert_eq!(err.kind(), AvsErrorKind::AlreadyTrained);
    }

    #[test]
    fn failed_training_leaves_index_untrained() {
        let config = Builder::new(4, 3, Metric::L2).build().unwrap();
        let mut index = IvfIndex::new(config, &ctx());

        let wide = Matrix::new(0.0f32, 10, 5);
        let err = index.train(wide.as_view()).unwrap_err();
        assert_eq!(err.kind(), AvsErrorKind::DimensionMismatch);
        assert!(!index.is_trained());

        let too_few = Matrix::new(0.0f32, 2, 4);
        let err = index.train(too_few.as_view()).unwrap_err();
        assert_eq!(err.kind(), AvsErrorKind::ClusteringError);
        assert!(err.to_string().contains("while training ivf centroids"));
        assert!(!index.is_trained());

        let data = Matrix::new(0.0f32, 10, 4);
        let wrong_shape = Fixed(Matrix::new(0.0f32, 2, 4));
        let err = index.train_with(data.as_view(), &wrong_shape).unwrap_err();
        assert_eq!(err.kind(), AvsErrorKind::ClusteringError);
        assert!(!index.is_trained());

        let config = Builder::new_with(4, 3, Metric::L2, |b| {
            b.path(ExecutionPath::Tile);
        })
        .build()
        .unwrap();
        let mut index = IvfIndex::new(config, &RuntimeContext::with_capability(Capability::Scalar));
        let err = index.train(data.as_view()).unwrap_err();
        assert_eq!(err.kind(), AvsErrorKind::UnsupportedHardware);
        assert!(!index.is_trained());
    }

    #[rstest]
    fn every_id_in_exactly_one_list(
        #[values(Metric::L2, Metric::InnerProduct)] metric: Metric,
        #[values(1, 7, 64)] batch_size: usize,
    ) {
        let mut rng = StdRng::seed_from_u64(17);
        let data = random_matrix(&mut rng, 200, 8);

        let config = Builder::new_with(8, 10, metric, |b| {
            b.batch_size(batch_size);
        })
        .build()
        .unwrap();
        let mut index = IvfIndex::new(config, &ctx());
        index.train(data.as_view()).unwrap();

        let lists = index.inverted_lists().unwrap();
        assert_eq!(lists.len(), 10);
        let mut ids: Vec<u32> = lists.iter().flatten().copied().collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..200).collect::<Vec<u32>>());
    }

    #[rstest]
    fn probing_every_list_matches_flat_search(
        #[values(Metric::L2, Metric::InnerProduct)] metric: Metric,
        #[values(ExecutionPath::Scalar, ExecutionPath::Simd)] path: ExecutionPath,
    ) {
        let mut rng = StdRng::seed_from_u64(99);
        let data = random_matrix(&mut rng, 120, 6);
        let queries = random_matrix(&mut rng, 5, 6);

        let config = Builder::new_with(6, 4, metric, |b| {
            b.n_probe(4).path(path).batch_size(16);
        })
        .build()
        .unwrap();
        let mut ivf = IvfIndex::new(config, &ctx());
        ivf.train(data.as_view()).unwrap();

        let config = flat::Builder::new_with(6, metric, |b| {
            b.path(path);
        })
        .build()
        .unwrap();
        let mut flat = FlatIndex::new(config, &ctx());
        flat.extend(data.as_view()).unwrap();

        for k in [0, 1, 10, 200] {
            assert_eq!(
                ivf.search(queries.as_view(), k).unwrap(),
                flat.search(queries.as_view(), k).unwrap(),
                "k = {k}"
            );
        }
    }

    #[test]
    fn results_come_from_searched_lists() {
        let mut rng = StdRng::seed_from_u64(5);
        let data = random_matrix(&mut rng, 100, 4);
        let queries = random_matrix(&mut rng, 8, 4);

        let config = Builder::new_with(4, 5, Metric::L2, |b| {
            b.path(ExecutionPath::Scalar);
        })
        .build()
        .unwrap();
        let mut index = IvfIndex::new(config, &ctx());
        index.train(data.as_view()).unwrap();

        let centroids = index.centroids().unwrap();
        let lists = index.inverted_lists().unwrap();
        let results = index.search(queries.as_view(), 3).unwrap();
        for (query, result) in queries.row_iter().zip(results.iter()) {
            let scores = Kernel::new(Metric::L2, ExecutionPath::Scalar)
                .compute(
                    &ctx(),
                    MatrixView::from_parts(query, 1, 4),
                    centroids,
                )
                .unwrap();
            let nearest = best_centroid(Metric::L2, scores.row(0)) as usize;
            let members = lists.get(nearest);
            assert_eq!(result.len(), members.len().min(3));
            assert!(result.iter().all(|r| members.contains(&r.id)));
            assert!(result.windows(2).all(|w| w[0].score <= w[1].score));
        }
    }
}
