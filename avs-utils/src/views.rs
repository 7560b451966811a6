/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::ops::{Index, IndexMut};

use thiserror::Error;

/// Storage that can be viewed as a dense slice.
///
/// Matrix views come in owned, borrowed, and mutably borrowed flavors. This trait lets
/// all three share the same row arithmetic.
///
/// # Safety
///
/// `as_slice` must always return the same slice with the same length. Row accessors rely
/// on the length established at construction.
pub unsafe trait DenseData {
    type Elem;

    /// Return the underlying data as a slice.
    fn as_slice(&self) -> &[Self::Elem];
}

/// A mutable companion to [`DenseData`].
///
/// # Safety
///
/// The slice returned by `as_mut_slice` must span exactly the memory of `as_slice`.
pub unsafe trait MutDenseData: DenseData {
    fn as_mut_slice(&mut self) -> &mut [Self::Elem];
}

// SAFETY: A shared slice always returns itself.
unsafe impl<T> DenseData for &[T] {
    type Elem = T;
    fn as_slice(&self) -> &[T] {
        self
    }
}

// SAFETY: A boxed slice never changes length.
unsafe impl<T> DenseData for Box<[T]> {
    type Elem = T;
    fn as_slice(&self) -> &[T] {
        self
    }
}

// SAFETY: Same memory as `as_slice`.
unsafe impl<T> MutDenseData for Box<[T]> {
    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }
}

////////////
// Matrix //
////////////

/// A dense block of memory interpreted as a row-major matrix.
///
/// Borrowed views over immutable memory are `Copy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixBase<T>
where
    T: DenseData,
{
    data: T,
    nrows: usize,
    ncols: usize,
}

/// Owning row-major matrix.
pub type Matrix<T> = MatrixBase<Box<[T]>>;

/// Borrowed row-major matrix.
pub type MatrixView<'a, T> = MatrixBase<&'a [T]>;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error(
    "tried to construct a matrix view with {nrows} rows and {ncols} columns over a slice \
     of length {len}"
)]
pub struct TryFromError {
    pub len: usize,
    pub nrows: usize,
    pub ncols: usize,
}

/// A generator for initializing the entries in a matrix via `Matrix::new`.
pub trait Generator<T> {
    fn generate(&mut self) -> T;
}

impl<T> Generator<T> for T
where
    T: Clone,
{
    fn generate(&mut self) -> T {
        self.clone()
    }
}

/// A matrix initializer that invokes the provided closure for each element.
pub struct Init<F>(pub F);

impl<T, F> Generator<T> for Init<F>
where
    F: FnMut() -> T,
{
    fn generate(&mut self) -> T {
        (self.0)()
    }
}

impl<T> Matrix<T> {
    /// Construct a new matrix filled from `generator` in memory order.
    pub fn new<U>(mut generator: U, nrows: usize, ncols: usize) -> Self
    where
        U: Generator<T>,
    {
        let data: Box<[T]> = (0..nrows * ncols).map(|_| generator.generate()).collect();
        Self { data, nrows, ncols }
    }

    /// Take ownership of `data` as an `nrows x ncols` matrix.
    pub fn from_vec(data: Vec<T>, nrows: usize, ncols: usize) -> Result<Self, TryFromError> {
        Self::try_from(data.into_boxed_slice(), nrows, ncols)
    }
}

impl<T> MatrixBase<T>
where
    T: DenseData,
{
    /// Construct a matrix over `data`, which must have exactly `nrows * ncols` elements.
    pub fn try_from(data: T, nrows: usize, ncols: usize) -> Result<Self, TryFromError> {
        let len = data.as_slice().len();
        if len != nrows * ncols {
            Err(TryFromError { len, nrows, ncols })
        } else {
            Ok(Self { data, nrows, ncols })
        }
    }

    /// Construct a matrix over `data`, which must have exactly `nrows * ncols` elements.
    ///
    /// # Panics
    ///
    /// Panics if the length of `data` does not match.
    #[track_caller]
    pub fn from_parts(data: T, nrows: usize, ncols: usize) -> Self {
        let len = data.as_slice().len();
        assert_eq!(
            len,
            nrows * ncols,
            "tried to construct a {nrows}x{ncols} matrix over a slice of length {len}"
        );
        Self { data, nrows, ncols }
    }

    /// Return the number of columns in the matrix.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Return the number of rows in the matrix.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Return `true` if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Return the underlying data as a slice.
    pub fn as_slice(&self) -> &[T::Elem] {
        self.data.as_slice()
    }

    /// Return the underlying data as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T::Elem]
    where
        T: MutDenseData,
    {
        self.data.as_mut_slice()
    }

    /// Return row `row` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.nrows()`.
    pub fn row(&self, row: usize) -> &[T::Elem] {
        assert!(
            row < self.nrows(),
            "tried to access row {row} of a matrix with {} rows",
            self.nrows()
        );
        let start = row * self.ncols;
        &self.as_slice()[start..start + self.ncols]
    }

    /// Return row `row` as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.nrows()`.
    pub fn row_mut(&mut self, row: usize) -> &mut [T::Elem]
    where
        T: MutDenseData,
    {
        assert!(
            row < self.nrows(),
            "tried to access row {row} of a matrix with {} rows",
            self.nrows()
        );
        let ncols = self.ncols;
        let start = row * ncols;
        &mut self.as_mut_slice()[start..start + ncols]
    }

    /// Iterate over the rows of the matrix beginning with row 0.
    ///
    /// A matrix with zero columns yields one empty slice per row.
    pub fn row_iter(&self) -> impl ExactSizeIterator<Item = &[T::Elem]> {
        let ncols = self.ncols;
        (0..self.nrows).map(move |i| &self.as_slice()[i * ncols..(i + 1) * ncols])
    }

    /// Mutably iterate over the rows of the matrix beginning with row 0.
    ///
    /// # Panics
    ///
    /// Panics if the matrix has zero columns.
    pub fn row_iter_mut(&mut self) -> impl ExactSizeIterator<Item = &mut [T::Elem]>
    where
        T: MutDenseData,
    {
        let ncols = self.ncols();
        self.data.as_mut_slice().chunks_exact_mut(ncols)
    }

    /// Return the sub-matrix made of rows `start..end`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or `end > self.nrows()`.
    pub fn rows(&self, start: usize, end: usize) -> MatrixView<'_, T::Elem> {
        assert!(
            start <= end && end <= self.nrows(),
            "row range {start}..{end} is out of bounds for a matrix with {} rows",
            self.nrows()
        );
        MatrixBase {
            data: &self.as_slice()[start * self.ncols..end * self.ncols],
            nrows: end - start,
            ncols: self.ncols,
        }
    }

    /// Divide the matrix into consecutive sub-matrices of (up to) `batchsize` rows.
    ///
    /// Every window except possibly the last has exactly `batchsize` rows. Windows are
    /// yielded front to back and together cover every row exactly once. An empty matrix
    /// yields no windows.
    ///
    /// # Panics
    ///
    /// Panics if `batchsize = 0`.
    pub fn window_iter(&self, batchsize: usize) -> impl Iterator<Item = MatrixView<'_, T::Elem>> {
        assert!(batchsize != 0, "window_iter batchsize cannot be zero");
        let nrows = self.nrows();
        (0..nrows)
            .step_by(batchsize)
            .map(move |start| self.rows(start, (start + batchsize).min(nrows)))
    }

    /// Return a view over the matrix.
    pub fn as_view(&self) -> MatrixView<'_, T::Elem> {
        MatrixBase {
            data: self.as_slice(),
            nrows: self.nrows(),
            ncols: self.ncols(),
        }
    }

    pub fn to_owned(&self) -> Matrix<T::Elem>
    where
        T::Elem: Clone,
    {
        Matrix {
            data: self.as_slice().into(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<'a, T> From<MatrixView<'a, T>> for &'a [T] {
    fn from(view: MatrixView<'a, T>) -> Self {
        view.data
    }
}

/// # Panics
///
/// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
impl<T> Index<(usize, usize)> for MatrixBase<T>
where
    T: DenseData,
{
    type Output = T::Elem;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(
            col < self.ncols(),
            "col {col} is out of bounds (max: {})",
            self.ncols()
        );
        &self.row(row)[col]
    }
}

/// # Panics
///
/// Panics if `row >= self.nrows()` or `col >= self.ncols()`.
impl<T> IndexMut<(usize, usize)> for MatrixBase<T>
where
    T: MutDenseData,
{
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(
            col < self.ncols(),
            "col {col} is out of bounds (max: {})",
            self.ncols()
        );
        &mut self.row_mut(row)[col]
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn is_copyable<T: Copy>(_x: T) -> bool {
        true
    }

    // 0, 1, 2,
    // 1, 2, 3,
    // 2, 3, 4,
    // 3, 4, 5
    fn make_test_matrix() -> Matrix<usize> {
        Matrix::from_vec(vec![0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4, 5], 4, 3).unwrap()
    }

    #[test]
    fn matrix_indexing() {
        let m = make_test_matrix();
        assert_eq!(m.nrows(), 4);
        assert_eq!(m.ncols(), 3);
        for i in 0..4 {
            for j in 0..3 {
                assert_eq!(m[(i, j)], i + j);
            }
            assert_eq!(m.row(i), &[i, i + 1, i + 2]);
        }

        let view = m.as_view();
        assert!(is_copyable(view));
        assert_eq!(view.as_slice().as_ptr(), m.as_slice().as_ptr());

        let rows: Vec<&[usize]> = view.row_iter().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], &[3, 4, 5]);
    }

    #[test]
    fn matrix_mutation() {
        let mut m = Matrix::<usize>::new(0, 4, 3);
        m.row_iter_mut().enumerate().for_each(|(i, row)| {
            row.iter_mut().enumerate().for_each(|(j, v)| *v = i + j);
        });
        assert_eq!(m, make_test_matrix());

        m[(1, 1)] = 100;
        assert_eq!(m.row(1), &[1, 100, 3]);
        m.row_mut(3)[0] = 7;
        assert_eq!(m.row(3), &[7, 4, 5]);
    }

    #[test]
    fn matrix_construction_happens_in_memory_order() {
        let mut i = 0;
        let m = Matrix::new(
            Init(|| {
                let value = (i % 3) + (i / 3);
                i += 1;
                value
            }),
            4,
            3,
        );
        assert_eq!(m, make_test_matrix());
    }

    #[test]
    fn try_from_error() {
        let data = vec![0.0f32; 12];
        let err = MatrixView::try_from(data.as_slice(), 5, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "tried to construct a matrix view with 5 rows and 4 columns over a slice of length 12"
        );
        assert_eq!(
            err,
            TryFromError {
                len: 12,
                nrows: 5,
                ncols: 4
            }
        );
    }

    #[test]
    fn from_parts() {
        let data = [1, 2, 3, 4, 5, 6];
        let m = MatrixView::from_parts(&data[..], 3, 2);
        assert_eq!(m.row(2), &[5, 6]);
    }

    #[test]
    #[should_panic(expected = "tried to construct a 2x2 matrix over a slice of length 3")]
    fn from_parts_panics() {
        let data = [1, 2, 3];
        let _ = MatrixView::from_parts(&data[..], 2, 2);
    }

    #[test]
    fn zero_sized_matrices() {
        let data: Vec<usize> = vec![];
        let m = MatrixView::try_from(data.as_slice(), 0, 10).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.window_iter(4).count(), 0);

        let m = MatrixView::try_from(data.as_slice(), 3, 0).unwrap();
        assert_eq!(m.nrows(), 3);
        let empty: &[usize] = &[];
        assert_eq!(m.row(2), empty);
        assert_eq!(m.row_iter().count(), 3);
    }

    #[rstest]
    fn window_iter_covers_every_row_once(
        #[values(1, 2, 3, 4, 5, 10)] batchsize: usize,
        #[values(1, 4, 7)] nrows: usize,
    ) {
        let ncols = 2;
        let m = Matrix::from_vec((0..nrows * ncols).collect(), nrows, ncols).unwrap();
        let windows: Vec<_> = m.window_iter(batchsize).collect();
        assert_eq!(windows.len(), nrows.div_ceil(batchsize));

        let mut seen = 0;
        for (i, window) in windows.iter().enumerate() {
            if i + 1 < windows.len() {
                assert_eq!(window.nrows(), batchsize);
            }
            assert_eq!(window.ncols(), ncols);
            for row in window.row_iter() {
                assert_eq!(row, m.row(seen));
                seen += 1;
            }
        }
        assert_eq!(seen, nrows);
    }

    #[test]
    fn rows_sub_matrix() {
        let m = make_test_matrix();
        let sub = m.rows(1, 3);
        assert_eq!(sub.nrows(), 2);
        assert_eq!(sub.row(0), &[1, 2, 3]);
        assert_eq!(sub.row(1), &[2, 3, 4]);
        assert!(m.rows(4, 4).is_empty());
        assert_eq!(sub.to_owned().as_slice(), &[1, 2, 3, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "tried to access row 3 of a matrix with 3 rows")]
    fn test_row_panics() {
        let m = Matrix::<usize>::new(0, 3, 7);
        m.row(3);
    }

    #[test]
    #[should_panic(expected = "col 7 is out of bounds (max: 7)")]
    fn test_index_panics_col() {
        let m = Matrix::<usize>::new(0, 3, 7);
        let _ = m[(2, 7)];
    }

    #[test]
    #[should_panic(expected = "window_iter batchsize cannot be zero")]
    fn test_window_iter_panics() {
        let m = Matrix::<usize>::new(0, 4, 4);
        let _ = m.window_iter(0);
    }
}
