/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use avs_utils::{Matrix, MatrixView};

use crate::error::DimensionMismatch;

/// Append-only, contiguous storage of fixed-dimension vectors.
///
/// A vector's id is its insertion position. Ids are never reused.
#[derive(Debug, Clone)]
pub struct Dataset {
    dim: usize,
    data: Vec<f32>,
}

impl Dataset {
    /// Create an empty dataset for vectors of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Copy every row of `data` into a new dataset.
    pub fn from_view(data: MatrixView<'_, f32>) -> Self {
        Self {
            dim: data.ncols(),
            data: data.as_slice().to_vec(),
        }
    }

    /// Append `vector` and return its id.
    ///
    /// On a length mismatch the dataset is left unchanged.
    pub fn push(&mut self, vector: &[f32]) -> Result<u32, DimensionMismatch> {
        self.check(vector.len())?;
        let id = self.next_id();
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    /// Append every row of `vectors`, returning the id of the first.
    ///
    /// On a column mismatch the dataset is left unchanged.
    pub fn extend(&mut self, vectors: MatrixView<'_, f32>) -> Result<u32, DimensionMismatch> {
        self.check(vectors.ncols())?;
        let id = self.next_id();
        self.data.extend_from_slice(vectors.as_slice());
        Ok(id)
    }

    /// Number of vectors stored.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the vector with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of bounds.
    pub fn row(&self, id: u32) -> &[f32] {
        let start = id as usize * self.dim;
        &self.data[start..start + self.dim]
    }

    /// View every stored vector as a `len() x dim()` matrix.
    pub fn as_view(&self) -> MatrixView<'_, f32> {
        MatrixView::from_parts(self.data.as_slice(), self.len(), self.dim)
    }

    /// Copy the vectors named by `ids` into a new matrix, in the order given.
    ///
    /// # Panics
    ///
    /// Panics if any id is out of bounds.
    pub fn gather(&self, ids: &[u32]) -> Matrix<f32> {
        let mut data = Vec::with_capacity(ids.len() * self.dim);
        for &id in ids {
            data.extend_from_slice(self.row(id));
        }
        Matrix::from_parts(data.into_boxed_slice(), ids.len(), self.dim)
    }

    fn check(&self, got: usize) -> Result<(), DimensionMismatch> {
        if got == self.dim {
            Ok(())
        } else {
            Err(DimensionMismatch {
                expected: self.dim,
                got,
            })
        }
    }

    fn next_id(&self) -> u32 {
        self.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read_back() {
        let mut dataset = Dataset::new(3);
        assert!(dataset.is_empty());
        assert_eq!(dataset.push(&[1.0, 2.0, 3.0]).unwrap(), 0);
        assert_eq!(dataset.push(&[4.0, 5.0, 6.0]).unwrap(), 1);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 3);
        assert_eq!(dataset.row(1), &[4.0, 5.0, 6.0]);

        let view = dataset.as_view();
        assert_eq!(view.nrows(), 2);
        assert_eq!(view.row(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn failed_push_leaves_dataset_unchanged() {
        let mut dataset = Dataset::new(2);
        dataset.push(&[1.0, 2.0]).unwrap();

        let err = dataset.push(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, DimensionMismatch { expected: 2, got: 3 });
        assert_eq!(dataset.len(), 1);

        let bad = Matrix::new(0.0f32, 4, 3);
        assert!(dataset.extend(bad.as_view()).is_err());
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn extend_and_gather() {
        let mut dataset = Dataset::new(2);
        dataset.push(&[0.0, 0.0]).unwrap();

        let more = Matrix::from_vec(vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0], 3, 2).unwrap();
        assert_eq!(dataset.extend(more.as_view()).unwrap(), 1);
        assert_eq!(dataset.len(), 4);

        let gathered = dataset.gather(&[3, 0, 2]);
        assert_eq!(gathered.nrows(), 3);
        assert_eq!(gathered.as_slice(), &[3.0, 3.0, 0.0, 0.0, 2.0, 2.0]);

        let none = dataset.gather(&[]);
        assert_eq!(none.nrows(), 0);
        assert_eq!(none.ncols(), 2);
    }
}
