/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::num::NonZeroUsize;

use avs_vector::distance::Metric;
use thiserror::Error;

use crate::{defaults, kernel::ExecutionPath, kmeans::KMeans};

/// Validated parameters of an [`super::IvfIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Dimension of every trained and queried vector.
    dim: NonZeroUsize,

    /// Number of centroids.
    n_list: NonZeroUsize,

    /// Number of centroids visited per query.
    n_probe: NonZeroUsize,

    /// Similarity measure used for assignment and ranking.
    metric: Metric,

    /// Kernel back end.
    path: ExecutionPath,

    /// Number of vectors scored per kernel call.
    batch_size: NonZeroUsize,

    /// Centroid training used by [`super::IvfIndex::train`].
    kmeans: KMeans,
}

impl Config {
    /// Attempt to construct a [`Config`] from a builder.
    ///
    /// See: [`Builder::build`].
    pub fn try_from_builder(builder: Builder) -> Result<Self, ConfigError> {
        let nonzero = |param: &'static str, val: usize| {
            NonZeroUsize::new(val).ok_or(ConfigErrorInner::Zero(param))
        };

        let n_list = nonzero("n_list", builder.n_list)?;
        let n_probe = nonzero("n_probe", builder.n_probe.unwrap_or(defaults::N_PROBE.get()))?;
        if n_probe > n_list {
            return Err(ConfigErrorInner::Probes(n_probe.get(), n_list.get()).into());
        }

        let max_iterations = nonzero(
            "kmeans_iterations",
            builder
                .kmeans_iterations
                .unwrap_or(defaults::KMEANS_MAX_ITERATIONS),
        )?;

        Ok(Self {
            dim: nonzero("dim", builder.dim)?,
            n_list,
            n_probe,
            metric: builder.metric,
            path: builder.path.unwrap_or(defaults::EXECUTION_PATH),
            batch_size: nonzero(
                "batch_size",
                builder.batch_size.unwrap_or(defaults::BATCH_SIZE.get()),
            )?,
            kmeans: KMeans::new(
                max_iterations.get(),
                builder.seed.unwrap_or(defaults::KMEANS_SEED),
            ),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim.get()
    }

    pub fn n_list(&self) -> usize {
        self.n_list.get()
    }

    pub fn n_probe(&self) -> usize {
        self.n_probe.get()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn path(&self) -> ExecutionPath {
        self.path
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn kmeans(&self) -> KMeans {
        self.kmeans
    }
}

/// Errors that can occur when building a [`Config`].
///
/// See [`Builder::build`] for possible failure modes.
#[derive(Debug, Clone, Error)]
#[error(transparent)]
pub struct ConfigError {
    #[from]
    inner: ConfigErrorInner,
}

impl From<ConfigError> for crate::AvsError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        crate::AvsError::new(crate::AvsErrorKind::IndexConfigError, error)
    }
}

#[derive(Debug, Clone, Error)]
enum ConfigErrorInner {
    #[error("parameter \"{0}\" invalid because it cannot be zero")]
    Zero(&'static str),
    #[error("parameter \"n_probe\" ({0}) must not be greater than \"n_list\" ({1})")]
    Probes(usize, usize),
}

/// A builder for [`Config`]. Invariants are checked by [`Builder::build`].
#[derive(Debug, Clone)]
pub struct Builder {
    dim: usize,
    n_list: usize,
    metric: Metric,

    // optional //
    n_probe: Option<usize>,
    path: Option<ExecutionPath>,
    batch_size: Option<usize>,
    kmeans_iterations: Option<usize>,
    seed: Option<u64>,
}

impl Builder {
    /// Construct a new builder with the required values.
    ///
    /// All other parameters will use their default values.
    pub fn new(dim: usize, n_list: usize, metric: Metric) -> Self {
        Self {
            dim,
            n_list,
            metric,
            n_probe: None,
            path: None,
            batch_size: None,
            kmeans_iterations: None,
            seed: None,
        }
    }

    /// Construct a new builder with the required values.
    ///
    /// A closure `f` can be used to chain additional builder methods inline.
    pub fn new_with<F>(dim: usize, n_list: usize, metric: Metric, f: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut this = Self::new(dim, n_list, metric);
        f(&mut this);
        this
    }

    /// Configure how many of the best centroids each query visits.
    ///
    /// Higher values improve recall at the cost of scoring more candidates.
    pub fn n_probe(&mut self, n_probe: usize) -> &mut Self {
        self.n_probe = Some(n_probe);
        self
    }

    /// Configure the kernel back end.
    pub fn path(&mut self, path: ExecutionPath) -> &mut Self {
        self.path = Some(path);
        self
    }

    /// Configure how many vectors are scored per kernel call.
    pub fn batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Configure the maximum number of Lloyd iterations during training.
    pub fn kmeans_iterations(&mut self, iterations: usize) -> &mut Self {
        self.kmeans_iterations = Some(iterations);
        self
    }

    /// Configure the seed of the centroid initialization.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Attempt to build the config. Fails if:
    ///
    /// * Any count is zero.
    /// * `n_probe` is greater than `n_list`.
    pub fn build(self) -> Result<Config, ConfigError> {
        Config::try_from_builder(self)
    }
}
