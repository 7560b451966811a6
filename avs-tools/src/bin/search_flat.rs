/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
use avs_tools::utils::{CMDResult, WorkloadArgs, init_subscriber, search_flat};
use clap::Parser;

/// Exhaustive top-k search over a synthetic dataset.
#[derive(Debug, Parser)]
struct SearchFlatArgs {
    #[command(flatten)]
    workload: WorkloadArgs,
}

fn main() -> CMDResult<()> {
    init_subscriber();

    let args = SearchFlatArgs::parse();

    match search_flat(&args.workload) {
        Ok(_) => Ok(()),
        Err(err) => {
            tracing::error!("Error: {:?}", err);
            Err(err)
        }
    }
}
