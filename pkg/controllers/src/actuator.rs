use pkg_cluster::ClusterClient;
use pkg_types::workload::Workload;
use tracing::debug;

use crate::error::ActuationError;

/// Issues the scale-to-zero call for workloads the evaluator selected.
pub struct ScaleActuator<'a, C: ?Sized> {
    client: &'a C,
    dry_run: bool,
}

impl<'a, C: ClusterClient + ?Sized> ScaleActuator<'a, C> {
    pub fn new(client: &'a C, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Scale `workload` to zero replicas with exactly one client call, or
    /// with none in dry-run mode. The caller reports both cases the same way.
    pub async fn apply(&self, workload: &Workload) -> Result<(), ActuationError> {
        if self.dry_run {
            debug!("dry run: not scaling {}", workload);
            return Ok(());
        }
        debug!("scaling {} to 0 via {}", workload, self.client.name());
        self.client
            .scale_to_zero(workload.kind(), workload.namespace(), workload.name())
            .await
            .map_err(|source| ActuationError {
                kind: workload.kind(),
                namespace: workload.namespace().to_string(),
                name: workload.name().to_string(),
                source,
            })
    }
}
