/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::fmt::Write;

use avs::{ExecutionPath, Metric, RuntimeContext, SearchResult};
use avs_linalg::Parallelism;
use clap::Args;

/// Workload options shared by the search drivers.
#[derive(Debug, Clone, Args)]
pub struct WorkloadArgs {
    /// The dimension of the vectors
    #[arg(long = "dim", short = 'd', default_value = "16")]
    pub dim: usize,

    /// Number of nearest neighbors
    #[arg(long = "top-k", short = 'k', default_value = "10")]
    pub top_k: usize,

    /// Number of dataset vectors scored per kernel call
    #[arg(long = "batch-size", short = 'b', default_value = "1024")]
    pub batch_size: usize,

    /// Number of vectors in the dataset
    #[arg(long = "nd", default_value = "10000")]
    pub nd: usize,

    /// Number of queries to execute
    #[arg(long = "nq", default_value = "1000")]
    pub nq: usize,

    /// Similarity metric <l2/ip>
    #[arg(long = "metric", default_value = "l2")]
    pub metric: Metric,

    /// Kernel execution path <scalar/simd/tile>
    #[arg(long = "path", default_value = "simd")]
    pub path: ExecutionPath,

    /// Seed for the synthetic dataset and queries
    #[arg(long = "seed", default_value = "47")]
    pub seed: u64,

    /// Threads used by matrix products. Defaults to the available parallelism.
    #[arg(long = "num-threads", short = 'T')]
    pub num_threads: Option<usize>,

    /// Number of result rows to print
    #[arg(long = "print-rows", default_value = "10")]
    pub print_rows: usize,
}

impl WorkloadArgs {
    /// Build the runtime context for this workload.
    pub fn runtime_context(&self) -> RuntimeContext {
        RuntimeContext::global()
            .with_parallelism(Parallelism::from_threads(get_num_threads(self.num_threads)))
    }
}

pub fn get_num_threads(num_threads: Option<usize>) -> usize {
    match num_threads {
        Some(n) => n,
        None => std::thread::available_parallelism().map_or(1, |n| n.get()),
    }
}

/// Default number of inverted lists for a dataset of `nd` vectors: `4 * sqrt(nd)`.
pub fn default_n_list(nd: usize) -> usize {
    ((4.0 * (nd as f64).sqrt()) as usize).max(1)
}

/// Render one query's results as `id:score` pairs separated by spaces.
pub fn format_results(results: &[SearchResult]) -> String {
    let mut line = String::new();
    for (i, r) in results.iter().enumerate() {
        if i != 0 {
            line.push(' ');
        }
        // Writing to a `String` cannot fail.
        let _ = write!(line, "{}:{:.4}", r.id, r.score);
    }
    line
}
