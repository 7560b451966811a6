/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use avs_vector::distance::Metric;

use super::{Neighbor, SearchResult};

/// Bounded top-k buffer ordered by ascending distance.
///
/// Ids and distances live in separate collections so the insertion scan only touches
/// distances. A candidate is placed after every entry with an equal distance, so among
/// ties the one inserted first stays ahead. Once the queue is full, candidates that are
/// not strictly better than the current worst entry are dropped.
///
/// `NaN` distances order after every number and tie with each other, so a query whose
/// scores overflow still fills the queue.
#[derive(Debug, Clone)]
pub struct NeighborPriorityQueue {
    capacity: usize,
    ids: Vec<u32>,
    distances: Vec<f32>,
}

impl NeighborPriorityQueue {
    /// Create a queue retaining at most `capacity` neighbors.
    ///
    /// A queue with zero capacity accepts nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: Vec::with_capacity(capacity),
            distances: Vec::with_capacity(capacity),
        }
    }

    /// Offer `nbr` to the queue.
    ///
    /// Returns `true` if the neighbor was retained.
    pub fn insert(&mut self, nbr: Neighbor) -> bool {
        if self.capacity == 0 {
            return false;
        }

        if self.is_full() {
            match self.distances.last() {
                Some(&worst) if precedes(nbr.distance, worst) => {
                    self.ids.pop();
                    self.distances.pop();
                }
                _ => return false,
            }
        }

        let insert_idx = self.upper_bound(nbr.distance);
        self.ids.insert(insert_idx, nbr.id);
        self.distances.insert(insert_idx, nbr.distance);

        debug_assert_eq!(self.ids.len(), self.distances.len());
        true
    }

    /// Return the distance a candidate must beat to enter a full queue, or `None` if
    /// the queue still has room.
    pub fn threshold(&self) -> Option<f32> {
        if self.is_full() {
            self.distances.last().copied()
        } else {
            None
        }
    }

    /// Return the neighbor at `index`, best first.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    pub fn get(&self, index: usize) -> Neighbor {
        Neighbor::new(self.ids[index], self.distances[index])
    }

    /// Iterate over the retained neighbors, best first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Neighbor> + '_ {
        self.ids
            .iter()
            .zip(self.distances.iter())
            .map(|(&id, &distance)| Neighbor::new(id, distance))
    }

    /// Remove every retained neighbor, best first, leaving the queue empty with its
    /// capacity unchanged.
    pub fn drain(&mut self) -> impl ExactSizeIterator<Item = Neighbor> + '_ {
        self.ids
            .drain(..)
            .zip(self.distances.drain(..))
            .map(|(id, distance)| Neighbor::new(id, distance))
    }

    /// Drain the queue into results carrying the natural score of `metric`, best first.
    pub fn drain_results(&mut self, metric: Metric) -> Vec<SearchResult> {
        self.drain()
            .map(|n| SearchResult::from_neighbor(metric, n))
            .collect()
    }

    pub fn size(&self) -> usize {
        self.ids.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.distances.clear();
    }

    /// First position whose distance orders strictly after `distance`.
    fn upper_bound(&self, distance: f32) -> usize {
        if distance.is_nan() {
            self.distances.len()
        } else {
            self.distances.partition_point(|&d| d <= distance)
        }
    }
}

/// Whether `a` orders strictly before `b`, with `NaN` after every number.
fn precedes(a: f32, b: f32) -> bool {
    a < b || (b.is_nan() && !a.is_nan())
}
