/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::sync::{Once, OnceLock};

use avs_linalg::Parallelism;
use avs_vector::Capability;
use tracing::{info, warn};

use super::ExecutionPath;
use crate::error::UnsupportedHardware;

/// The numeric runtime every kernel invocation runs against.
///
/// A context records which acceleration tier may be used and how matrix multiplies are
/// scheduled. Construct one up front and pass it by reference to every kernel and index
/// call, or share the lazily initialized [`RuntimeContext::global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeContext {
    capability: Capability,
    parallelism: Parallelism,
}

static MISSING_TILE_WARNING: Once = Once::new();

impl RuntimeContext {
    /// Probe the machine and build a context for whatever it offers.
    ///
    /// Missing tile acceleration is not an error: a warning is logged (once per process)
    /// and the scalar and SIMD paths remain usable.
    pub fn new() -> Self {
        let capability = Capability::detect();
        if capability.supports(Capability::TileAccelAvailable) {
            info!(%capability, "tile acceleration available");
        } else {
            MISSING_TILE_WARNING.call_once(|| {
                warn!(
                    %capability,
                    "tile matrix-multiply acceleration is not supported on this machine, \
                     only scalar and SIMD execution paths are usable"
                );
            });
        }
        Self::with_capability(capability)
    }

    /// Build a context that advertises exactly `capability`, regardless of the hardware.
    ///
    /// Pinning [`Capability::TileAccelAvailable`] on a machine without tile units still
    /// produces correct results: the tile path's reduced-precision GEMM is executed in
    /// software.
    pub fn with_capability(capability: Capability) -> Self {
        Self {
            capability,
            parallelism: Parallelism::Sequential,
        }
    }

    /// Return the process-wide context, initializing it on first use.
    ///
    /// Concurrent first calls observe a single initialization.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<RuntimeContext> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Return a copy of `self` that schedules matrix multiplies with `parallelism`.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Check that `path` can run under this context.
    pub fn require(&self, path: ExecutionPath) -> Result<(), UnsupportedHardware> {
        let requested = path.required_capability();
        if self.capability.supports(requested) {
            Ok(())
        } else {
            Err(UnsupportedHardware {
                requested,
                available: self.capability,
            })
        }
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}
