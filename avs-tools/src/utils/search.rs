/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::time::Instant;

use avs::{FlatIndex, IvfIndex, SearchResult, flat, ivf};
use clap::Args;
use tracing::info;

use super::{CMDResult, CMDToolError, WorkloadArgs, default_n_list, format_results, random_workload};

/// Inverted-file options for the `search_ivf` driver.
#[derive(Debug, Clone, Default, Args)]
pub struct IvfArgs {
    /// Number of inverted lists. Defaults to 4 * sqrt(nd).
    #[arg(long = "n-list")]
    pub n_list: Option<usize>,

    /// Number of lists visited per query
    #[arg(long = "n-probe", default_value = "1")]
    pub n_probe: usize,

    /// Maximum number of k-means iterations during training
    #[arg(long = "kmeans-iterations")]
    pub kmeans_iterations: Option<usize>,

    /// Print the contents of every inverted list after training
    #[arg(long = "print-lists")]
    pub print_lists: bool,
}

/// Build a [`FlatIndex`] over the synthetic dataset described by `args` and search it with
/// the synthetic queries, logging timings and the first `print_rows` result lines.
pub fn search_flat(args: &WorkloadArgs) -> CMDResult<Vec<Vec<SearchResult>>> {
    let ctx = args.runtime_context();
    info!(capability = %ctx.capability(), threads = ctx.parallelism().threads(), "runtime");

    let config = flat::Builder::new_with(args.dim, args.metric, |b| {
        b.batch_size(args.batch_size).path(args.path);
    })
    .build()?;

    let (data, queries) = random_workload(args.seed, args.dim, args.nd, args.nq);

    let mut index = FlatIndex::new(config, &ctx);
    index.extend(data.as_view())?;

    let (n, dim) = index.shape();
    info!("No. of vectors: {}", n);
    info!("Dimension of dataset vectors: {}", dim);
    info!("No. of query vectors: {}", queries.nrows());

    let start = Instant::now();
    let results = index.search(queries.as_view(), args.top_k)?;
    info!(
        "Duration ({} {}): {} ms",
        args.metric,
        args.path,
        start.elapsed().as_millis()
    );

    log_results(&results, args.print_rows);
    Ok(results)
}

/// Train an [`IvfIndex`] on the synthetic dataset described by `workload` and search it.
pub fn search_ivf(workload: &WorkloadArgs, args: &IvfArgs) -> CMDResult<Vec<Vec<SearchResult>>> {
    let ctx = workload.runtime_context();
    info!(capability = %ctx.capability(), threads = ctx.parallelism().threads(), "runtime");

    let n_list = args.n_list.unwrap_or_else(|| default_n_list(workload.nd));
    let config = ivf::Builder::new_with(workload.dim, n_list, workload.metric, |b| {
        b.n_probe(args.n_probe)
            .path(workload.path)
            .batch_size(workload.batch_size)
            .seed(workload.seed);
        if let Some(iterations) = args.kmeans_iterations {
            b.kmeans_iterations(iterations);
        }
    })
    .build()?;

    let (data, queries) = random_workload(workload.seed, workload.dim, workload.nd, workload.nq);

    let mut index = IvfIndex::new(config, &ctx);

    let start = Instant::now();
    index.train(data.as_view())?;
    info!("Training time: {} ms", start.elapsed().as_millis());

    let lists = index
        .inverted_lists()
        .ok_or_else(|| CMDToolError::new("index reported no inverted lists after training"))?;
    info!(
        lists = lists.len(),
        occupied = lists.num_occupied(),
        ids = lists.num_ids(),
        "trained"
    );
    if args.print_lists {
        print!("{}", lists);
    }

    let start = Instant::now();
    let results = index.search(queries.as_view(), workload.top_k)?;
    info!(
        "Duration ({} {}, n_list {}, n_probe {}): {} ms",
        workload.metric,
        workload.path,
        n_list,
        args.n_probe,
        start.elapsed().as_millis()
    );

    log_results(&results, workload.print_rows);
    Ok(results)
}

fn log_results(results: &[Vec<SearchResult>], rows: usize) {
    for (i, row) in results.iter().take(rows).enumerate() {
        info!("query {}: {}", i, format_results(row));
    }
}
