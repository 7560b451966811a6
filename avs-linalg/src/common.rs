/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::num::NonZeroUsize;

/// Indicate whether a matrix should be implicitly transposed for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    /// Use a provided matrix directly.
    None,
    /// Use the transpose of a matrix.
    Ordinary,
}

impl Transpose {
    /// Return whether or not the enum is `Transpose::Ordinary`.
    pub fn is_transpose(&self) -> bool {
        matches!(self, Self::Ordinary)
    }

    /// Call exactly one of the arguments depending on the value of `self` and return the
    /// result.
    pub fn call<F, G, T>(&self, if_none: F, if_transpose: G) -> T
    where
        F: FnOnce() -> T,
        G: FnOnce() -> T,
    {
        match self {
            Self::None => if_none(),
            Self::Ordinary => if_transpose(),
        }
    }
}

/// How a single GEMM request is executed.
///
/// `Threads` hands the product to the worker pool backing the GEMM implementation. The
/// numeric result is the same as `Sequential` up to floating point reassociation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Run on the calling thread.
    #[default]
    Sequential,
    /// Split the product across (at most) this many worker threads.
    Threads(NonZeroUsize),
}

impl Parallelism {
    /// Construct a parallelism policy from a thread count, collapsing `0` and `1` to
    /// [`Parallelism::Sequential`].
    pub fn from_threads(threads: usize) -> Self {
        match NonZeroUsize::new(threads) {
            Some(n) if n.get() > 1 => Self::Threads(n),
            _ => Self::Sequential,
        }
    }

    /// The number of threads this policy may occupy.
    pub fn threads(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Threads(n) => n.get(),
        }
    }
}
