//! Workload annotation keys read by the lease evaluator.

/// Maximum idle duration before a workload is scaled to zero (e.g. `"30m"`).
pub const LEASE: &str = "net.guoyk.autodown/lease";

/// Boolean switch that suppresses the lease regardless of its value.
pub const DISABLED: &str = "net.guoyk.autodown/disabled";
