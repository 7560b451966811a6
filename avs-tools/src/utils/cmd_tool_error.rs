/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::fmt::{Debug, Display};

use avs::AvsError;

/// Error reported by the command line drivers.
///
/// The drivers only need a message to print, so every upstream error is flattened into
/// its formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMDToolError {
    pub details: String,
}

impl CMDToolError {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }
}

impl Display for CMDToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl std::error::Error for CMDToolError {}

impl From<AvsError> for CMDToolError {
    fn from(err: AvsError) -> Self {
        Self {
            details: err.to_string(),
        }
    }
}

impl From<avs::flat::ConfigError> for CMDToolError {
    fn from(err: avs::flat::ConfigError) -> Self {
        AvsError::from(err).into()
    }
}

impl From<avs::ivf::ConfigError> for CMDToolError {
    fn from(err: avs::ivf::ConfigError) -> Self {
        AvsError::from(err).into()
    }
}
