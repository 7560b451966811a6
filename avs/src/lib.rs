/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Batched vector similarity search.
//!
//! * [`kernel`]: scalar, SIMD and tile (bf16 GEMM) distance kernels behind one
//!   [`kernel::Kernel`] contract, evaluated under an explicit [`kernel::RuntimeContext`].
//! * [`flat::FlatIndex`]: exhaustive top-k search streaming the dataset in bounded chunks.
//! * [`ivf::IvfIndex`]: inverted-file approximate search over k-means clusters.

pub mod dataset;
pub mod defaults;
pub mod error;
pub mod flat;
pub mod ivf;
pub mod kernel;
pub mod kmeans;
pub mod neighbor;

#[cfg(test)]
pub(crate) mod tracing;

// Top level exports.
pub use avs_vector::{Capability, distance::Metric};
pub use error::{AvsError, AvsErrorKind, AvsResult};
pub use flat::FlatIndex;
pub use ivf::IvfIndex;
pub use kernel::{ExecutionPath, Kernel, RuntimeContext};
pub use neighbor::SearchResult;
