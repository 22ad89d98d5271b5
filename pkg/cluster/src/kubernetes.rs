use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use pkg_types::workload::{Condition, Workload, WorkloadKind};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

use crate::client::{ClusterClient, ClusterError};

/// Replica count Kubernetes assumes when `spec.replicas` is unset.
const DEFAULT_REPLICAS: u32 = 1;

/// Per-kind accessors for a scalable Kubernetes resource.
///
/// Everything else (listing, snapshotting, patching the scale subresource)
/// is written once against this trait.
pub trait ScalableResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: WorkloadKind;

    fn spec_replicas(&self) -> Option<i32>;

    fn status_conditions(&self) -> Vec<Condition>;
}

impl ScalableResource for Deployment {
    const KIND: WorkloadKind = WorkloadKind::Deployment;

    fn spec_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }

    fn status_conditions(&self) -> Vec<Condition> {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| Condition {
                        condition_type: c.type_.clone(),
                        last_transition_time: c.last_transition_time.as_ref().map(|t| t.0),
                        last_update_time: c.last_update_time.as_ref().map(|t| t.0),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ScalableResource for StatefulSet {
    const KIND: WorkloadKind = WorkloadKind::StatefulSet;

    fn spec_replicas(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }

    fn status_conditions(&self) -> Vec<Condition> {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| Condition {
                        condition_type: c.type_.clone(),
                        last_transition_time: c.last_transition_time.as_ref().map(|t| t.0),
                        last_update_time: None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Build the immutable snapshot the controllers evaluate.
pub fn snapshot<K: ScalableResource>(obj: &K, namespace: &str) -> Workload {
    let replicas = obj
        .spec_replicas()
        .map(|r| u32::try_from(r).unwrap_or(0))
        .unwrap_or(DEFAULT_REPLICAS);
    Workload::new(
        K::KIND,
        obj.namespace().unwrap_or_else(|| namespace.to_string()),
        obj.name_any(),
        obj.annotations().clone(),
        obj.status_conditions(),
        replicas,
    )
}

/// Merge patch body for the scale subresource. Only `spec.replicas` changes.
fn scale_patch() -> serde_json::Value {
    serde_json::json!({
        "spec": {
            "replicas": 0
        }
    })
}

/// Cluster client backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using in-cluster service account credentials, falling back
    /// to the local kubeconfig.
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    async fn list<K: ScalableResource>(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        debug!(
            "Listed {} {} object(s) in namespace {}",
            list.items.len(),
            K::KIND,
            namespace
        );
        Ok(list.items.iter().map(|obj| snapshot(obj, namespace)).collect())
    }

    async fn scale<K: ScalableResource>(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let patch = scale_patch();
        api.patch_scale(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &str,
    ) -> Result<Vec<Workload>, ClusterError> {
        match kind {
            WorkloadKind::Deployment => self.list::<Deployment>(namespace).await,
            WorkloadKind::StatefulSet => self.list::<StatefulSet>(namespace).await,
        }
    }

    async fn scale_to_zero(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        match kind {
            WorkloadKind::Deployment => self.scale::<Deployment>(namespace, name).await,
            WorkloadKind::StatefulSet => self.scale::<StatefulSet>(namespace, name).await,
        }
    }

    fn name(&self) -> &str {
        "kubernetes"
    }
}
