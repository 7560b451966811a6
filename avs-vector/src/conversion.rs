/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use half::{bf16, slice::HalfFloatSliceExt};

/// Perform a numeric cast on a slice of values.
///
/// Narrowing casts round to nearest-even. Widening casts are exact.
pub trait CastFromSlice<From> {
    fn cast_from_slice(self, from: From);
}

impl CastFromSlice<&[f32]> for &mut [bf16] {
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[inline]
    fn cast_from_slice(self, from: &[f32]) {
        self.convert_from_f32_slice(from)
    }
}

impl CastFromSlice<&[bf16]> for &mut [f32] {
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[inline]
    fn cast_from_slice(self, from: &[bf16]) {
        from.convert_to_f32_slice(self)
    }
}

/// Round every element of `x` to `bf16`, appending to `out`.
pub fn extend_bf16(out: &mut Vec<bf16>, x: &[f32]) {
    out.extend(x.iter().copied().map(bf16::from_f32));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bf16_round_trip() {
        let src = [1.0f32, -2.5, 0.0, 256.0, 1.0 / 3.0];
        let mut narrow = vec![bf16::ZERO; src.len()];
        narrow.as_mut_slice().cast_from_slice(&src[..]);

        let mut wide = vec![0.0f32; src.len()];
        wide.as_mut_slice().cast_from_slice(narrow.as_slice());

        // Exactly representable values survive.
        assert_eq!(&wide[..4], &src[..4]);
        // Others land within bf16 precision (8 bits of mantissa).
        assert!((wide[4] - src[4]).abs() < src[4] * (1.0 / 256.0));

        let mut extended = Vec::new();
        extend_bf16(&mut extended, &src);
        assert_eq!(extended, narrow);
    }
}
