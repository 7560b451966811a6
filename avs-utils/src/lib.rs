/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

// Views
pub mod views;
pub use views::{Matrix, MatrixView};
