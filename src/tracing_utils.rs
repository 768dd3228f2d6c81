// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Diagnostics for the function converters.
//!
//! With the `tracing` feature the macros below are the ones from the `tracing`
//! crate; without it they expand to nothing so the conversion path carries no
//! logging cost.

// When tracing feature is enabled, export tracing crate directly
#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

// When tracing feature is disabled, define macros directly
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($args:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($args:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug, trace};
