/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::fmt;

/// Mapping from centroid index to the ids of the vectors assigned to it.
///
/// Every id appears in exactly one list, and each list is in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedLists {
    lists: Vec<Vec<u32>>,
}

impl InvertedLists {
    /// Build the lists from one centroid index per vector, in id order.
    pub(crate) fn from_assignment(n_list: usize, assignment: &[u32]) -> Self {
        let mut lists = vec![Vec::new(); n_list];
        for (id, &centroid) in assignment.iter().enumerate() {
            lists[centroid as usize].push(id as u32);
        }
        Self { lists }
    }

    /// Number of lists, which equals the number of centroids.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Members of list `centroid`.
    ///
    /// # Panics
    ///
    /// Panics if `centroid >= self.len()`.
    pub fn get(&self, centroid: usize) -> &[u32] {
        &self.lists[centroid]
    }

    /// Iterate over every list in centroid order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[u32]> {
        self.lists.iter().map(|list| list.as_slice())
    }

    /// Total number of ids across all lists.
    pub fn num_ids(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// Number of lists that received at least one vector.
    pub fn num_occupied(&self) -> usize {
        self.lists.iter().filter(|list| !list.is_empty()).count()
    }
}

/// Writes the number of occupied lists, then every occupied list as a `Centroid idx: i`
/// header line followed by a line of its member ids.
impl fmt::Display for InvertedLists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.num_occupied())?;
        for (centroid, list) in self.lists.iter().enumerate() {
            if list.is_empty() {
                continue;
            }
            writeln!(f, "Centroid idx: {}", centroid)?;
            for id in list {
                write!(f, "{} ", id)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
