/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Straight-line reference kernels.

/// Squared Euclidean distance between `x` and `y`.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
pub fn squared_l2(x: &[f32], y: &[f32]) -> f32 {
    assert_eq!(x.len(), y.len(), "vectors must have the same length");
    std::iter::zip(x.iter(), y.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}

/// Dot product of `x` and `y`.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
pub fn inner_product(x: &[f32], y: &[f32]) -> f32 {
    assert_eq!(x.len(), y.len(), "vectors must have the same length");
    std::iter::zip(x.iter(), y.iter()).map(|(a, b)| a * b).sum()
}
