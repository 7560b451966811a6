/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
#![warn(missing_debug_implementations, missing_docs)]
use std::str::FromStr;

use thiserror::Error;

/// Distance metric
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Metric {
    /// Squared Euclidean (L2-Squared). Lower is better.
    L2,
    /// Inner product. Higher is better.
    InnerProduct,
}

impl Metric {
    /// Returns the string representation of the metric.
    pub const fn as_str(self) -> &'static str {
        match self {
            Metric::L2 => "l2",
            Metric::InnerProduct => "innerproduct",
        }
    }

    /// Return `true` if the natural score `a` ranks strictly ahead of `b`.
    pub fn is_better(self, a: f32, b: f32) -> bool {
        match self {
            Metric::L2 => a < b,
            Metric::InnerProduct => a > b,
        }
    }

    /// Convert a natural score into a distance where smaller is always better.
    ///
    /// L2 scores are returned as-is. Inner products are negated.
    pub fn to_distance(self, score: f32) -> f32 {
        match self {
            Metric::L2 => score,
            Metric::InnerProduct => -score,
        }
    }

    /// Invert [`Metric::to_distance`].
    pub fn from_distance(self, distance: f32) -> f32 {
        // Negation is its own inverse.
        self.to_distance(distance)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Metric`].
#[derive(Debug, Error)]
pub enum ParseMetricError {
    /// The string is not a recognized metric.
    #[error("Invalid format for Metric: {0}")]
    InvalidFormat(String),
}

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" => Ok(Metric::L2),
            "innerproduct" | "inner_product" | "ip" => Ok(Metric::InnerProduct),
            _ => Err(ParseMetricError::InvalidFormat(String::from(s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Metric, ParseMetricError};

    #[test]
    fn test_metric_from_str() {
        assert_eq!(Metric::from_str("l2").unwrap(), Metric::L2);
        assert_eq!(Metric::from_str("L2").unwrap(), Metric::L2);
        assert_eq!(
            Metric::from_str("innerproduct").unwrap(),
            Metric::InnerProduct
        );
        assert_eq!(Metric::from_str("ip").unwrap(), Metric::InnerProduct);
        assert_eq!(
            Metric::from_str("cosine").unwrap_err().to_string(),
            ParseMetricError::InvalidFormat(String::from("cosine")).to_string()
        );

        for metric in [Metric::L2, Metric::InnerProduct] {
            assert_eq!(Metric::from_str(&metric.to_string()).unwrap(), metric);
        }
    }

    #[test]
    fn test_ordering() {
        assert!(Metric::L2.is_better(1.0, 2.0));
        assert!(!Metric::L2.is_better(2.0, 2.0));
        assert!(Metric::InnerProduct.is_better(2.0, 1.0));
        assert!(!Metric::InnerProduct.is_better(1.0, 1.0));

        // Distances always minimize.
        for metric in [Metric::L2, Metric::InnerProduct] {
            let (a, b) = (3.0, 5.0);
            let better = if metric.is_better(a, b) { a } else { b };
            let worse = if better == a { b } else { a };
            assert!(metric.to_distance(better) < metric.to_distance(worse));
            assert_eq!(metric.from_distance(metric.to_distance(a)), a);
        }
    }
}
