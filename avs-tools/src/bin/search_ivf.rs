/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
use avs_tools::utils::{CMDResult, IvfArgs, WorkloadArgs, init_subscriber, search_ivf};
use clap::Parser;

/// Train an inverted-file index on a synthetic dataset and search it.
#[derive(Debug, Parser)]
struct SearchIvfArgs {
    #[command(flatten)]
    workload: WorkloadArgs,

    #[command(flatten)]
    ivf: IvfArgs,
}

fn main() -> CMDResult<()> {
    init_subscriber();

    let args = SearchIvfArgs::parse();

    match search_ivf(&args.workload, &args.ivf) {
        Ok(_) => Ok(()),
        Err(err) => {
            tracing::error!("Error: {:?}", err);
            Err(err)
        }
    }
}
