/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Hardware capability detection.
//!
//! Detection runs once per process and the answer is cached. Capabilities are nested: a
//! machine with tile acceleration also offers 512-bit SIMD.

use std::sync::atomic::{AtomicU64, Ordering};

/// The acceleration tier offered by the running machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Plain scalar code only.
    Scalar,
    /// 512-bit vector instructions (AVX-512F).
    SimdAvailable,
    /// Matrix-multiply tile units with bf16 inputs (AMX-BF16).
    TileAccelAvailable,
}

impl Capability {
    /// Return the capability of the running machine.
    ///
    /// The first call queries the CPU. Later calls return the cached answer.
    pub fn detect() -> Self {
        let mut number = CAPABILITY_NUMBER.load(Ordering::Relaxed);
        if number == CAPABILITY_UNINITIALIZED {
            number = resolve_capability();
        }
        Self::from_number(number)
    }

    /// Return `true` if `self` includes everything `required` offers.
    pub fn supports(self, required: Capability) -> bool {
        self >= required
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::SimdAvailable => "simd",
            Self::TileAccelAvailable => "tile",
        }
    }

    fn from_number(number: u64) -> Self {
        match number {
            CAPABILITY_TILE => Self::TileAccelAvailable,
            CAPABILITY_SIMD => Self::SimdAvailable,
            _ => Self::Scalar,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// 0: Uninitialized
// 1: Scalar
// 2: SIMD
// 3: Tile
static CAPABILITY_NUMBER: AtomicU64 = AtomicU64::new(CAPABILITY_UNINITIALIZED);

// NOTE: Must be properly nested in ascending order.
const CAPABILITY_UNINITIALIZED: u64 = 0;
const CAPABILITY_SCALAR: u64 = 1;
const CAPABILITY_SIMD: u64 = 2;
const CAPABILITY_TILE: u64 = 3;

#[inline(never)]
fn resolve_capability() -> u64 {
    let number = capability_number();
    CAPABILITY_NUMBER.store(number, Ordering::Relaxed);
    number
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        fn capability_number() -> u64 {
            if !is_x86_feature_detected!("avx512f") {
                CAPABILITY_SCALAR
            } else if has_amx_bf16() {
                CAPABILITY_TILE
            } else {
                CAPABILITY_SIMD
            }
        }

        /// AMX-BF16 is reported in CPUID leaf 7, sub-leaf 0, EDX bit 22.
        #[allow(unused_unsafe)]
        fn has_amx_bf16() -> bool {
            use std::arch::x86_64::{__cpuid_count, __get_cpuid_max};

            const AMX_BF16_BIT: u32 = 1 << 22;

            // SAFETY: `cpuid` is available on every x86_64 processor.
            let (max_leaf, _) = unsafe { __get_cpuid_max(0) };
            if max_leaf < 7 {
                return false;
            }

            // SAFETY: Leaf 7 was verified to be supported above.
            let leaf = unsafe { __cpuid_count(7, 0) };
            leaf.edx & AMX_BF16_BIT != 0
        }
    } else {
        fn capability_number() -> u64 {
            CAPABILITY_SCALAR
        }
    }
}

/// Return `true` if the AVX-512 kernels may run on this machine.
#[inline]
pub(crate) fn simd_enabled() -> bool {
    Capability::detect().supports(Capability::SimdAvailable)
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_are_nested() {
        assert!(Capability::Scalar < Capability::SimdAvailable);
        assert!(Capability::SimdAvailable < Capability::TileAccelAvailable);

        assert!(Capability::TileAccelAvailable.supports(Capability::SimdAvailable));
        assert!(Capability::TileAccelAvailable.supports(Capability::Scalar));
        assert!(!Capability::SimdAvailable.supports(Capability::TileAccelAvailable));
        assert!(Capability::Scalar.supports(Capability::Scalar));
    }

    #[test]
    fn detection_is_cached() {
        let first = Capability::detect();
        assert_ne!(
            CAPABILITY_NUMBER.load(Ordering::Relaxed),
            CAPABILITY_UNINITIALIZED
        );
        assert_eq!(Capability::detect(), first);
    }

    #[test]
    fn number_round_trip() {
        for cap in [
            Capability::Scalar,
            Capability::SimdAvailable,
            Capability::TileAccelAvailable,
        ] {
            let number = match cap {
                Capability::Scalar => CAPABILITY_SCALAR,
                Capability::SimdAvailable => CAPABILITY_SIMD,
                Capability::TileAccelAvailable => CAPABILITY_TILE,
            };
            assert_eq!(Capability::from_number(number), cap);
        }
        assert_eq!(Capability::TileAccelAvailable.to_string(), "tile");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn detection_matches_std() {
        let cap = Capability::detect();
        assert_eq!(
            cap.supports(Capability::SimdAvailable),
            is_x86_feature_detected!("avx512f")
        );
    }
}
