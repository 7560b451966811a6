/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::num::NonZeroUsize;

use crate::kernel::ExecutionPath;

/// Number of dataset vectors handed to a kernel at once. Peak scratch memory of a search
/// scales with this value times the dimension.
pub const BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

/// Visit only the single best centroid per query.
pub const N_PROBE: NonZeroUsize = NonZeroUsize::new(1).unwrap();

/// The SIMD path runs everywhere (a portable rendition backs it on machines without
/// AVX-512), so it is the default choice.
pub const EXECUTION_PATH: ExecutionPath = ExecutionPath::Simd;

/// Upper bound on Lloyd iterations during k-means training.
pub const KMEANS_MAX_ITERATIONS: usize = 12;

/// Seed for the k-means++ initialization.
pub const KMEANS_SEED: u64 = 0xc0ffee;

/// Training stops once the relative improvement of the residual falls below this value.
pub const KMEANS_TOLERANCE: f32 = 1e-5;
