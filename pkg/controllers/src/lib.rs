//! Lease evaluation and scale-down controllers.
//!
//! One pass: [`scanner::WorkloadScanner`] lists namespaces and workloads,
//! [`lease::evaluate`] decides per workload (using [`activity::resolve`]
//! for the last activity time), [`actuator::ScaleActuator`] scales the
//! expired ones to zero, and [`report::RunReport`] keeps the trace.

pub mod activity;
pub mod actuator;
pub mod error;
pub mod lease;
pub mod report;
pub mod scanner;

pub use error::{ActuationError, ScanError};
pub use lease::{Decision, PolicyError, SkipReason, evaluate};
pub use report::{Outcome, RunReport, TraceEntry};
pub use scanner::{ScanConfig, WorkloadScanner};
