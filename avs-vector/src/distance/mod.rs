/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

pub mod scalar;
pub mod simd;

pub mod implementations;
pub use implementations::{InnerProduct, SquaredL2};

mod metric;
pub use metric::{Metric, ParseMetricError};
