use pkg_types::workload::{Workload, WorkloadKind};
use std::fmt;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::error::ScanError;
use crate::lease::{PolicyError, SkipReason};

/// What happened to one workload during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    /// Reported identically in live and dry-run mode.
    ScaledToZero,
    PolicyError(PolicyError),
    ActuationFailed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped(reason) => write!(f, "{}", reason),
            Outcome::ScaledToZero => f.write_str("scaled to 0"),
            Outcome::PolicyError(err) => write!(f, "{}", err),
            Outcome::ActuationFailed(msg) => write!(f, "failed to scale to 0: {}", msg),
        }
    }
}

/// One line of the run trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    pub outcome: Outcome,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}, {}", self.kind, self.name, self.outcome)
    }
}

/// Per-run counters logged when the run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub namespaces: usize,
    pub evaluated: usize,
    pub scaled: usize,
    pub skipped: usize,
    pub policy_errors: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "namespaces: {}, workloads: {}, scaled: {}, skipped: {}, policy errors: {}",
            self.namespaces, self.evaluated, self.scaled, self.skipped, self.policy_errors
        )
    }
}

/// Collects the trace of a single scan and decides the exit status.
#[derive(Debug, Default)]
pub struct RunReport {
    namespaces: Vec<String>,
    excluded: Vec<String>,
    entries: Vec<TraceEntry>,
    fatal: Option<ScanError>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_namespace(&mut self, namespace: &str) {
        info!("-- namespace: {}", namespace);
        self.namespaces.push(namespace.to_string());
    }

    pub fn record_excluded(&mut self, namespace: &str) {
        info!("-- namespace: {}, excluded", namespace);
        self.excluded.push(namespace.to_string());
    }

    /// Append the outcome for `workload` and emit its trace line.
    pub fn record(&mut self, workload: &Workload, outcome: Outcome) {
        let entry = TraceEntry {
            kind: workload.kind(),
            namespace: workload.namespace().to_string(),
            name: workload.name().to_string(),
            outcome,
        };
        match entry.outcome {
            Outcome::Skipped(_) | Outcome::ScaledToZero => info!("{}", entry),
            Outcome::PolicyError(_) => warn!("{}", entry),
            Outcome::ActuationFailed(_) => error!("{}", entry),
        }
        self.entries.push(entry);
    }

    /// Mark the run as failed. Only the first fatal error is kept.
    pub fn fail(&mut self, err: ScanError) {
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn fatal(&self) -> Option<&ScanError> {
        self.fatal.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.fatal.is_none()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            namespaces: self.namespaces.len(),
            evaluated: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            match entry.outcome {
                Outcome::Skipped(_) => summary.skipped += 1,
                Outcome::ScaledToZero => summary.scaled += 1,
                Outcome::PolicyError(_) => summary.policy_errors += 1,
                Outcome::ActuationFailed(_) => {}
            }
        }
        summary
    }

    /// Emit the summary and the terminal status line, and map the run to a
    /// process exit code.
    pub fn finish(&self) -> ExitCode {
        info!("{}", self.summary());
        match &self.fatal {
            None => {
                info!("exited");
                ExitCode::SUCCESS
            }
            Some(err) => {
                error!("exited with error: {}", err);
                ExitCode::FAILURE
            }
        }
    }
}
