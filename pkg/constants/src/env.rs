//! Environment variables recognized by the autodown binary.

/// Boolean; when truthy the run computes decisions without scaling anything.
pub const DRY_RUN: &str = "AUTODOWN_DRY_RUN";

/// Standard tracing filter directive variable.
pub const LOG_FILTER: &str = "RUST_LOG";
