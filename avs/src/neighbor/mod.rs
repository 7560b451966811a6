/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use avs_vector::distance::Metric;

mod queue;
pub use queue::NeighborPriorityQueue;

//////////////
// Neighbor //
//////////////

/// A candidate and its distance to the query.
///
/// `distance` is always a minimization score: squared L2 as-is and the negated inner
/// product for [`Metric::InnerProduct`]. This lets one queue serve both metrics.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the candidate in its dataset.
    pub id: u32,

    /// Minimization score of the candidate.
    pub distance: f32,
}

impl Neighbor {
    pub fn new(id: u32, distance: f32) -> Self {
        Self { id, distance }
    }

    /// Return the contents of `self` as a tuple.
    pub fn as_tuple(self) -> (u32, f32) {
        (self.id, self.distance)
    }
}

//////////////////
// SearchResult //
//////////////////

/// One ranked hit returned to callers.
///
/// `score` is in the metric's natural units: squared distance for L2 (lower is better),
/// similarity for inner product (higher is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub id: u32,
    pub score: f32,
}

impl SearchResult {
    /// Convert a queue entry back to the natural score of `metric`.
    pub fn from_neighbor(metric: Metric, neighbor: Neighbor) -> Self {
        Self {
            id: neighbor.id,
            score: metric.from_distance(neighbor.distance),
        }
    }
}
