//! Cluster resource client: namespace and workload enumeration plus the
//! scale-to-zero call, behind one trait so the controllers never see the
//! transport.

pub mod client;
pub mod kubernetes;
pub mod memory;

pub use client::{ClusterClient, ClusterError};
pub use kubernetes::KubeCluster;
pub use memory::{MemoryCluster, ScaleCall};
