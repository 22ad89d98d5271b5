use async_trait::async_trait;
use pkg_types::workload::{Workload, WorkloadKind};
use thiserror::Error;

/// Failure reported by a cluster collaborator.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },
    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

/// The three calls autodown needs from a cluster.
///
/// Every call is awaited to completion before the next one is issued;
/// implementations need not support concurrent use beyond `Send + Sync`.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Names of all namespaces, in the order the cluster returns them.
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// Snapshot every workload of `kind` in `namespace`.
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &str,
    ) -> Result<Vec<Workload>, ClusterError>;

    /// Set the desired replica count of one workload to zero, touching no
    /// other field. Calling it on a workload already at zero is a no-op.
    async fn scale_to_zero(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError>;

    /// Client name (for logging)
    fn name(&self) -> &str;
}
