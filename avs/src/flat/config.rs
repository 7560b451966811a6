/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::num::NonZeroUsize;

use avs_vector::distance::Metric;
use thiserror::Error;

use crate::{defaults, kernel::ExecutionPath};

/// Validated parameters of a [`super::FlatIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Dimension of every stored and queried vector.
    dim: NonZeroUsize,

    /// Similarity measure and top-k ordering.
    metric: Metric,

    /// Number of dataset vectors scored per kernel call.
    batch_size: NonZeroUsize,

    /// Kernel back end.
    path: ExecutionPath,
}

impl Config {
    /// Attempt to construct a [`Config`] from a builder.
    ///
    /// See: [`Builder::build`].
    pub fn try_from_builder(builder: Builder) -> Result<Self, ConfigError> {
        let nonzero = |param: &'static str, val: usize| {
            NonZeroUsize::new(val).ok_or(ConfigErrorInner::Zero(param))
        };

        Ok(Self {
            dim: nonzero("dim", builder.dim)?,
            metric: builder.metric,
            batch_size: nonzero(
                "batch_size",
                builder.batch_size.unwrap_or(defaults::BATCH_SIZE.get()),
            )?,
            path: builder.path.unwrap_or(defaults::EXECUTION_PATH),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim.get()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn path(&self) -> ExecutionPath {
        self.path
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
}

/// A builder for [`Config`]. Invariants are checked by [`Builder::build`].
#[derive(Debug, Clone)]
pub struct Builder {
    dim: usize,
    metric: Metric,

    // optional //
    batch_size: Option<usize>,
    path: Option<ExecutionPath>,
}

impl Builder {
    /// Construct a new builder with the required values.
    ///
    /// All other parameters will use their default values.
    pub fn new(dim: usize, metric: Metric) -> Self {
        Self {
            dim,
            metric,
            batch_size: None,
            path: None,
        }
    }

    /// Construct a new builder with the required values.
    ///
    /// A closure `f` can be used to chain additional builder methods inline.
    pub fn new_with<F>(dim: usize, metric: Metric, f: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut this = Self::new(dim, metric);
        f(&mut this);
        this
    }

    /// Configure how many dataset vectors are scored per kernel call.
    ///
    /// Larger batches amortize kernel overhead at the cost of scratch memory. Results do
    /// not depend on this value.
    pub fn batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Configure the kernel back end.
    pub fn path(&mut self, path: ExecutionPath) -> &mut Self {
        self.path = Some(path);
        self
    }

    /// Attempt to build the config. Fails if `dim` or `batch_size` is zero.
    pub fn build(self) -> Result<Config, ConfigError> {
        Config::try_from_builder(self)
    }
}
