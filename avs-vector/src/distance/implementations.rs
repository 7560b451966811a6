/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use super::{Metric, simd};
use crate::PureDistanceFunction;

/// Compute the squared euclidean distance between two vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredL2;

impl PureDistanceFunction<&[f32], &[f32], f32> for SquaredL2 {
    #[inline]
    fn evaluate(x: &[f32], y: &[f32]) -> f32 {
        simd::squared_l2(x, y)
    }
}

/// Compute the inner product between two vectors.
///
/// The returned value is the mathematical inner product, not a negated similarity score.
#[derive(Debug, Clone, Copy, Default)]
pub struct InnerProduct;

impl PureDistanceFunction<&[f32], &[f32], f32> for InnerProduct {
    #[inline]
    fn evaluate(x: &[f32], y: &[f32]) -> f32 {
        simd::inner_product(x, y)
    }
}

impl Metric {
    /// Return the 16-lane kernel computing this metric's natural score.
    pub fn simd_kernel(self) -> fn(&[f32], &[f32]) -> f32 {
        match self {
            Metric::L2 => |x, y| SquaredL2::evaluate(x, y),
            Metric::InnerProduct => |x, y| InnerProduct::evaluate(x, y),
        }
    }

    /// Return the scalar reference kernel computing this metric's natural score.
    pub fn scalar_kernel(self) -> fn(&[f32], &[f32]) -> f32 {
        match self {
            Metric::L2 => super::scalar::squared_l2,
            Metric::InnerProduct => super::scalar::inner_product,
        }
    }
}
