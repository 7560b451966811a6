/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Typed error payloads. Each converts into an [`AvsError`] with the matching kind and can
//! be recovered from it with [`AvsError::downcast_ref`].

use avs_vector::Capability;
use thiserror::Error;

use super::{AvsError, AvsErrorKind};

/// A vector's length differs from the dimension the index was configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected vectors of dimension {expected}, got {got}")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub got: usize,
}

/// Query and candidate batches handed to a kernel have different inner dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("kernel operands disagree on dimension: queries have {left}, candidates have {right}")]
pub struct ShapeMismatch {
    pub left: usize,
    pub right: usize,
}

/// An execution path needs more than the runtime context offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("execution requires {requested} support but the runtime context offers {available}")]
pub struct UnsupportedHardware {
    pub requested: Capability,
    pub available: Capability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the index must be trained before it can be searched")]
pub struct NotTrained;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the index has already been trained")]
pub struct AlreadyTrained;

macro_rules! into_avs_error {
    ($payload:ident) => {
        impl From<$payload> for AvsError {
            #[track_caller]
            fn from(err: $payload) -> Self {
                AvsError::new(AvsErrorKind::$payload, err)
            }
        }
    };
}

into_avs_error!(DimensionMismatch);
into_avs_error!(ShapeMismatch);
into_avs_error!(UnsupportedHardware);
into_avs_error!(NotTrained);
into_avs_error!(AlreadyTrained);
