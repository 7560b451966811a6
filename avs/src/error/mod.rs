/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

pub(crate) mod avs_error;
pub use avs_error::{AvsError, AvsErrorKind, AvsResult, ErrorContext};

mod variants;
pub use variants::{AlreadyTrained, DimensionMismatch, NotTrained, ShapeMismatch, UnsupportedHardware};

#[cfg(test)]
macro_rules! message {
    ($kind:expr, $($args:tt)*) => {
        $crate::AvsError::message($kind, format!($($args)*))
    };
}

#[cfg(test)]
pub(crate) use message;
