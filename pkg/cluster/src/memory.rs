use async_trait::async_trait;
use pkg_types::workload::{Workload, WorkloadKind};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::client::{ClusterClient, ClusterError};

/// A scale-to-zero request observed by [`MemoryCluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleCall {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

#[derive(Default)]
struct Inner {
    namespaces: Vec<String>,
    workloads: Vec<Workload>,
    list_calls: Vec<(WorkloadKind, String)>,
    scale_calls: Vec<ScaleCall>,
    namespace_failure: Option<String>,
    list_failures: Vec<(WorkloadKind, String, String)>,
    scale_failures: Vec<(ScaleCall, String)>,
}

/// In-memory cluster that records every call and can be told to fail.
///
/// Scaling a workload replaces its stored snapshot with one at zero
/// replicas, so repeated scans observe the effect of earlier ones.
#[derive(Default)]
pub struct MemoryCluster {
    inner: Mutex<Inner>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a namespace with no workloads.
    pub fn add_namespace(&self, namespace: &str) {
        let mut state = self.state();
        if !state.namespaces.iter().any(|ns| ns == namespace) {
            state.namespaces.push(namespace.to_string());
        }
    }

    /// Register a workload, creating its namespace if needed.
    pub fn add_workload(&self, workload: Workload) {
        self.add_namespace(workload.namespace());
        self.state().workloads.push(workload);
    }

    /// Make `list_namespaces` fail.
    pub fn fail_namespace_listing(&self, message: &str) {
        self.state().namespace_failure = Some(message.to_string());
    }

    /// Make `list_workloads` fail for one kind in one namespace.
    pub fn fail_listing(&self, kind: WorkloadKind, namespace: &str, message: &str) {
        self.state()
            .list_failures
            .push((kind, namespace.to_string(), message.to_string()));
    }

    /// Make `scale_to_zero` fail for one workload.
    pub fn fail_scaling(&self, kind: WorkloadKind, namespace: &str, name: &str, message: &str) {
        let call = ScaleCall {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        };
        self.state().scale_failures.push((call, message.to_string()));
    }

    /// Every successful scale-to-zero request, in order.
    pub fn scale_calls(&self) -> Vec<ScaleCall> {
        self.state().scale_calls.clone()
    }

    /// Every `list_workloads` request, in order.
    pub fn list_calls(&self) -> Vec<(WorkloadKind, String)> {
        self.state().list_calls.clone()
    }

    /// Current replica count of a stored workload.
    pub fn replicas_of(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Option<u32> {
        self.state()
            .workloads
            .iter()
            .find(|w| w.kind() == kind && w.namespace() == namespace && w.name() == name)
            .map(Workload::replicas)
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let state = self.state();
        if let Some(message) = &state.namespace_failure {
            return Err(ClusterError::Unavailable(message.clone()));
        }
        Ok(state.namespaces.clone())
    }

    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &str,
    ) -> Result<Vec<Workload>, ClusterError> {
        let mut state = self.state();
        state.list_calls.push((kind, namespace.to_string()));
        if let Some((_, _, message)) = state
            .list_failures
            .iter()
            .find(|(k, ns, _)| *k == kind && ns == namespace)
        {
            return Err(ClusterError::Unavailable(message.clone()));
        }
        Ok(state
            .workloads
            .iter()
            .filter(|w| w.kind() == kind && w.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn scale_to_zero(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        let mut state = self.state();
        let call = ScaleCall {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        };
        if let Some((_, message)) = state.scale_failures.iter().find(|(c, _)| *c == call) {
            return Err(ClusterError::Unavailable(message.clone()));
        }

        let Some(slot) = state
            .workloads
            .iter_mut()
            .find(|w| w.kind() == kind && w.namespace() == namespace && w.name() == name)
        else {
            return Err(ClusterError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        };
        *slot = Workload::new(
            slot.kind(),
            slot.namespace(),
            slot.name(),
            slot.annotations().clone(),
            slot.conditions().to_vec(),
            0,
        );
        debug!("memory cluster: {} {}/{} scaled to 0", kind, namespace, name);
        state.scale_calls.push(call);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
