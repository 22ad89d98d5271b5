//! Log output conventions.

/// Value of the `prefix` field on the root span; every line of a run
/// carries it.
pub const PREFIX: &str = "autodown";
