use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::policy::LeasePolicy;

// --- Workload kind ---

/// Scalable workload kinds the scanner knows how to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
}

impl WorkloadKind {
    /// Every supported kind, in scan order.
    pub const ALL: [WorkloadKind; 2] = [WorkloadKind::Deployment, WorkloadKind::StatefulSet];

    /// Lowercase name used in trace lines.
    pub fn label(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "statefulset",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Status conditions ---

/// One status condition record as reported by the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub condition_type: String,
    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
    /// Only Deployments report this one.
    #[serde(default)]
    pub last_update_time: Option<DateTime<Utc>>,
}

impl Condition {
    pub fn new(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            ..Default::default()
        }
    }

    pub fn transitioned_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_transition_time = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_update_time = Some(at);
        self
    }

    /// All timestamps carried by this record, set or not.
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.last_transition_time
            .iter()
            .chain(self.last_update_time.iter())
            .copied()
    }
}

// --- Workload snapshot ---

/// Immutable snapshot of a scalable workload, taken once per scan.
///
/// The lease policy is parsed from the annotations when the snapshot is
/// built, so evaluation never touches raw annotation strings.
#[derive(Debug, Clone)]
pub struct Workload {
    kind: WorkloadKind,
    namespace: String,
    name: String,
    annotations: BTreeMap<String, String>,
    conditions: Vec<Condition>,
    replicas: u32,
    policy: LeasePolicy,
}

impl Workload {
    pub fn new(
        kind: WorkloadKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
        annotations: BTreeMap<String, String>,
        conditions: Vec<Condition>,
        replicas: u32,
    ) -> Self {
        let policy = LeasePolicy::from_annotations(&annotations);
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            annotations,
            conditions,
            replicas,
            policy,
        }
    }

    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    pub fn policy(&self) -> &LeasePolicy {
        &self.policy
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}
