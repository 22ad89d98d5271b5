use pkg_cluster::ClusterError;
use pkg_types::workload::WorkloadKind;
use thiserror::Error;

/// The scale-to-zero request for one workload failed.
#[derive(Debug, Error)]
#[error("failed to scale {kind} {namespace}/{name} to 0: {source}")]
pub struct ActuationError {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    pub source: ClusterError,
}

/// Fatal conditions that end a scan. Policy errors are not among them.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list namespaces: {0}")]
    ListNamespaces(#[source] ClusterError),
    #[error("failed to list {kind}s in namespace {namespace}: {source}")]
    ListWorkloads {
        kind: WorkloadKind,
        namespace: String,
        source: ClusterError,
    },
    #[error(transparent)]
    Actuation(#[from] ActuationError),
}
