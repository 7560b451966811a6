/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! 16-lane kernels.
//!
//! Vectors are walked in blocks of [`LANES`] floats, each lane accumulating with a
//! multiply-add, followed by a single horizontal reduction. The tail block (when the length
//! is not a multiple of [`LANES`]) is handled with a masked load on AVX-512 and a scalar
//! loop in the portable form.

/// The number of `f32` lanes in a 512-bit register.
pub const LANES: usize = 16;

/// Squared Euclidean distance using the widest available 16-lane implementation.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn squared_l2(x: &[f32], y: &[f32]) -> f32 {
    assert_eq!(x.len(), y.len(), "vectors must have the same length");

    #[cfg(target_arch = "x86_64")]
    if crate::arch::simd_enabled() {
        // SAFETY: AVX-512F was detected on the running CPU and the lengths are equal.
        return unsafe { x86_64::squared_l2_avx512(x, y) };
    }

    portable::squared_l2(x, y)
}

/// Dot product using the widest available 16-lane implementation.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn inner_product(x: &[f32], y: &[f32]) -> f32 {
    assert_eq!(x.len(), y.len(), "vectors must have the same length");

    #[cfg(target_arch = "x86_64")]
    if crate::arch::simd_enabled() {
        // SAFETY: AVX-512F was detected on the running CPU and the lengths are equal.
        return unsafe { x86_64::inner_product_avx512(x, y) };
    }

    portable::inner_product(x, y)
}

/// Portable 16-lane kernels. The lane loop is written so the compiler can map it onto
/// whatever vector unit the target offers.
pub mod portable {
    use super::LANES;

    #[inline(always)]
    fn reduce(acc: [f32; LANES]) -> f32 {
        // Pairwise tree reduction mirrors the shuffle pattern of a horizontal add.
        let mut width = LANES;
        let mut acc = acc;
        while width > 1 {
            width /= 2;
            for i in 0..width {
                acc[i] += acc[i + width];
            }
        }
        acc[0]
    }

    /// Portable form of [`super::squared_l2`].
    pub fn squared_l2(x: &[f32], y: &[f32]) -> f32 {
        debug_assert_eq!(x.len(), y.len());
        let mut acc = [0.0f32; LANES];

        let xs = x.chunks_exact(LANES);
        let ys = y.chunks_exact(LANES);
        let (xt, yt) = (xs.remainder(), ys.remainder());

        for (xb, yb) in std::iter::zip(xs, ys) {
            for i in 0..LANES {
                let d = xb[i] - yb[i];
                acc[i] += d * d;
            }
        }

        let tail: f32 = std::iter::zip(xt, yt)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum();
        reduce(acc) + tail
    }

    /// Portable form of [`super::inner_product`].
    pub fn inner_product(x: &[f32], y: &[f32]) -> f32 {
        debug_assert_eq!(x.len(), y.len());
        let mut acc = [0.0f32; LANES];

        let xs = x.chunks_exact(LANES);
        let ys = y.chunks_exact(LANES);
        let (xt, yt) = (xs.remainder(), ys.remainder());

        for (xb, yb) in std::iter::zip(xs, ys) {
            for i in 0..LANES {
                acc[i] += xb[i] * yb[i];
            }
        }

        let tail: f32 = std::iter::zip(xt, yt).map(|(a, b)| a * b).sum();
        reduce(acc) + tail
    }
}

#[cfg(target_arch = "x86_64")]
mod x86_64 {
    use std::arch::x86_64::{
        __m512, __mmask16, _mm512_fmadd_ps, _mm512_loadu_ps, _mm512_maskz_loadu_ps,
        _mm512_reduce_add_ps, _mm512_setzero_ps, _mm512_sub_ps,
    };

    use super::LANES;

    #[inline(always)]
    fn tail_mask(remainder: usize) -> __mmask16 {
        debug_assert!(remainder < LANES);
        ((1u32 << remainder) - 1) as __mmask16
    }

    /// # Safety
    ///
    /// The caller must verify AVX-512F is available and that `x.len() == y.len()`.
    #[target_feature(enable = "avx512f")]
    pub(super) unsafe fn squared_l2_avx512(x: &[f32], y: &[f32]) -> f32 {
        let len = x.len();
        let blocks = len / LANES;
        let remainder = len % LANES;
        let (px, py) = (x.as_ptr(), y.as_ptr());

        // SAFETY: Every full-width load reads `[i * LANES, (i + 1) * LANES)` with
        // `i < blocks`, which is in-bounds for both slices. The masked load only touches
        // the `remainder` trailing elements.
        unsafe {
            let mut acc: __m512 = _mm512_setzero_ps();
            for i in 0..blocks {
                let vx = _mm512_loadu_ps(px.add(i * LANES));
                let vy = _mm512_loadu_ps(py.add(i * LANES));
                let d = _mm512_sub_ps(vx, vy);
                acc = _mm512_fmadd_ps(d, d, acc);
            }

            if remainder != 0 {
                let mask = tail_mask(remainder);
                let vx = _mm512_maskz_loadu_ps(mask, px.add(blocks * LANES));
                let vy = _mm512_maskz_loadu_ps(mask, py.add(blocks * LANES));
                let d = _mm512_sub_ps(vx, vy);
                acc = _mm512_fmadd_ps(d, d, acc);
            }

            _mm512_reduce_add_ps(acc)
        }
    }

    /// # Safety
    ///
    /// The caller must verify AVX-512F is available and that `x.len() == y.len()`.
    #[target_feature(enable = "avx512f")]
    pub(super) unsafe fn inner_product_avx512(x: &[f32], y: &[f32]) -> f32 {
        let len = x.len();
        let blocks = len / LANES;
        let remainder = len % LANES;
        let (px, py) = (x.as_ptr(), y.as_ptr());

        // SAFETY: See `squared_l2_avx512`.
        unsafe {
            let mut acc: __m512 = _mm512_setzero_ps();
            for i in 0..blocks {
                let vx = _mm512_loadu_ps(px.add(i * LANES));
                let vy = _mm512_loadu_ps(py.add(i * LANES));
                acc = _mm512_fmadd_ps(vx, vy, acc);
            }

            if remainder != 0 {
                let mask = tail_mask(remainder);
                let vx = _mm512_maskz_loadu_ps(mask, px.add(blocks * LANES));
                let vy = _mm512_maskz_loadu_ps(mask, py.add(blocks * LANES));
                acc = _mm512_fmadd_ps(vx, vy, acc);
            }

            _mm512_reduce_add_ps(acc)
        }
    }
}

///////////
// Tests //
///////////
