/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
//! # vector
//!
//! Distance kernels over `f32` vectors. Every kernel comes in a scalar reference form and a
//! 16-lane SIMD form; the SIMD form uses AVX-512 when the running CPU supports it and an
//! equivalent portable 16-lane loop otherwise.
//!
//! The [`arch`] module answers which acceleration tiers the running machine offers.
#![cfg_attr(
    not(test),
    warn(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::undocumented_unsafe_blocks
    )
)]

mod traits;
pub use traits::PureDistanceFunction;

pub mod arch;
pub use arch::Capability;

pub mod conversion;
pub mod distance;
