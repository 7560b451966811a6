/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
pub mod cmd_tool_error;
pub use cmd_tool_error::*;

pub type CMDResult<T> = Result<T, CMDToolError>;

pub mod random_data;
pub use random_data::*;

pub mod search;
pub use search::*;

pub mod search_utils;
pub use search_utils::*;

pub mod tracing;
pub use tracing::{init_subscriber, init_test_subscriber};
