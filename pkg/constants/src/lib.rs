//! Centralized constants for autodown.
//!
//! Annotation keys, environment variable names, default paths and the log
//! prefix live here
//! so that every crate agrees on them.

pub mod annotations;
pub mod env;
pub mod logging;
pub mod paths;
