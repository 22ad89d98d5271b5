use chrono::{DateTime, TimeDelta, Utc};
use pkg_types::duration::DurationError;
use pkg_types::policy::LeaseSpec;
use pkg_types::workload::Workload;
use std::fmt;
use thiserror::Error;

use crate::activity;

/// Why a workload was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NoAnnotations,
    NoLease,
    Disabled,
    AlreadyAtZero,
    ActivityUnknown,
    LeaseNotExpired,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NoAnnotations => "no annotations",
            SkipReason::NoLease => "no lease declared",
            SkipReason::Disabled => "disabled",
            SkipReason::AlreadyAtZero => "already at zero",
            SkipReason::ActivityUnknown => "activity unknown",
            SkipReason::LeaseNotExpired => "lease not expired",
        };
        f.write_str(s)
    }
}

/// A lease annotation that could not be parsed. Never fatal to a scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid lease value '{raw}': {reason}")]
pub struct PolicyError {
    pub raw: String,
    pub reason: DurationError,
}

/// Outcome of evaluating one workload against its lease policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Act,
    Error(PolicyError),
}

/// Decide what to do with a workload at time `now`.
///
/// Rules apply in order and the first match wins:
/// 1. no annotations
/// 2. no lease declared
/// 3. disabled
/// 4. unparseable lease (error)
/// 5. already at zero replicas
/// 6. activity unknown
/// 7. idle for less than the lease
/// 8. otherwise act
///
/// Idle time equal to the lease is eligible.
pub fn evaluate(workload: &Workload, now: DateTime<Utc>) -> Decision {
    let policy = workload.policy();

    if !policy.annotated {
        return Decision::Skip(SkipReason::NoAnnotations);
    }
    if policy.lease == LeaseSpec::Absent {
        return Decision::Skip(SkipReason::NoLease);
    }
    if policy.disabled {
        return Decision::Skip(SkipReason::Disabled);
    }

    let lease = match &policy.lease {
        LeaseSpec::Declared(d) => *d,
        LeaseSpec::Invalid { raw, reason } => {
            return Decision::Error(PolicyError {
                raw: raw.clone(),
                reason: reason.clone(),
            });
        }
        LeaseSpec::Absent => return Decision::Skip(SkipReason::NoLease),
    };

    if workload.replicas() == 0 {
        return Decision::Skip(SkipReason::AlreadyAtZero);
    }

    let Some(last_active) = activity::resolve(workload.conditions()) else {
        return Decision::Skip(SkipReason::ActivityUnknown);
    };

    // leases beyond TimeDelta's range can never expire
    let lease = TimeDelta::from_std(lease).unwrap_or(TimeDelta::MAX);
    if now - last_active < lease {
        return Decision::Skip(SkipReason::LeaseNotExpired);
    }

    Decision::Act
}
