use chrono::{DateTime, Utc};
use pkg_cluster::ClusterClient;
use pkg_types::workload::{Workload, WorkloadKind};
use tracing::warn;

use crate::actuator::ScaleActuator;
use crate::error::ScanError;
use crate::lease::{self, Decision, SkipReason};
use crate::report::{Outcome, RunReport};

/// Settings for one scan, built by the binary from flags, environment and
/// config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub dry_run: bool,
    /// Kinds to scan, always in `WorkloadKind::ALL` order.
    kinds: Vec<WorkloadKind>,
    pub exclude_namespaces: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            kinds: WorkloadKind::ALL.to_vec(),
            exclude_namespaces: Vec::new(),
        }
    }
}

impl ScanConfig {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Restrict the scan to `kinds`. Scan order stays fixed regardless of
    /// the order given.
    pub fn with_kinds(mut self, kinds: &[WorkloadKind]) -> Self {
        self.kinds = WorkloadKind::ALL
            .into_iter()
            .filter(|k| kinds.contains(k))
            .collect();
        self
    }

    pub fn with_excluded_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.exclude_namespaces = namespaces;
        self
    }

    pub fn kinds(&self) -> &[WorkloadKind] {
        &self.kinds
    }
}

/// Walks every namespace and workload once, evaluating leases and scaling
/// idle workloads to zero.
pub struct WorkloadScanner<'a, C: ?Sized> {
    client: &'a C,
    config: ScanConfig,
}

impl<'a, C: ClusterClient + ?Sized> WorkloadScanner<'a, C> {
    pub fn new(client: &'a C, config: ScanConfig) -> Self {
        Self { client, config }
    }

    /// Run a full pass with `now` as the single reference time for every
    /// decision. Fatal errors stop the pass and are recorded in the report.
    pub async fn scan(&self, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::new();
        if let Err(err) = self.scan_into(now, &mut report).await {
            report.fail(err);
        }
        report
    }

    async fn scan_into(&self, now: DateTime<Utc>, report: &mut RunReport) -> Result<(), ScanError> {
        let namespaces = self
            .client
            .list_namespaces()
            .await
            .map_err(ScanError::ListNamespaces)?;

        for ns in namespaces {
            if self.config.exclude_namespaces.contains(&ns) {
                report.record_excluded(&ns);
                continue;
            }
            report.record_namespace(&ns);
            self.scan_namespace(&ns, now, report).await?;
        }
        Ok(())
    }

    async fn scan_namespace(
        &self,
        ns: &str,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<(), ScanError> {
        let actuator = ScaleActuator::new(self.client, self.config.dry_run);

        for &kind in self.config.kinds() {
            let workloads = self
                .client
                .list_workloads(kind, ns)
                .await
                .map_err(|source| ScanError::ListWorkloads {
                    kind,
                    namespace: ns.to_string(),
                    source,
                })?;

            for workload in &workloads {
                let decision = lease::evaluate(workload, now);
                if let Some(raw) = ignored_disabled_value(workload, &decision) {
                    warn!(
                        "{}: {}, ignoring unrecognized disabled value '{}'",
                        kind,
                        workload.name(),
                        raw
                    );
                }

                match decision {
                    Decision::Skip(reason) => report.record(workload, Outcome::Skipped(reason)),
                    Decision::Error(err) => report.record(workload, Outcome::PolicyError(err)),
                    Decision::Act => match actuator.apply(workload).await {
                        Ok(()) => report.record(workload, Outcome::ScaledToZero),
                        Err(err) => {
                            report.record(workload, Outcome::ActuationFailed(err.source.to_string()));
                            return Err(err.into());
                        }
                    },
                }
            }
        }
        Ok(())
    }
}

/// The unrecognized disabled value, if evaluation got as far as the disabled
/// rule. Workloads skipped for lacking a lease never reach it.
fn ignored_disabled_value<'w>(workload: &'w Workload, decision: &Decision) -> Option<&'w str> {
    match decision {
        Decision::Skip(SkipReason::NoAnnotations | SkipReason::NoLease) => None,
        _ => workload.policy().unrecognized_disabled.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use pkg_cluster::{MemoryCluster, ScaleCall};
    use pkg_constants::annotations;
    use pkg_types::workload::Condition;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn make_workload(
        kind: WorkloadKind,
        ns: &str,
        name: &str,
        pairs: &[(&str, &str)],
        idle: TimeDelta,
        replicas: u32,
    ) -> Workload {
        let ann: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Workload::new(
            kind,
            ns,
            name,
            ann,
            vec![Condition::new("Available").transitioned_at(now() - idle)],
            replicas,
        )
    }

    fn outcomes(report: &RunReport) -> Vec<(String, Outcome)> {
        report
            .entries()
            .iter()
            .map(|e| (e.name.clone(), e.outcome.clone()))
            .collect()
    }

    fn sample_cluster() -> MemoryCluster {
        let cluster = MemoryCluster::new();
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "apps",
            "api",
            &[(annotations::LEASE, "1h")],
            TimeDelta::hours(2),
            3,
        ));
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "apps",
            "worker",
            &[(annotations::LEASE, "1h")],
            TimeDelta::minutes(30),
            3,
        ));
        cluster.add_workload(make_workload(
            WorkloadKind::StatefulSet,
            "apps",
            "cache",
            &[(annotations::DISABLED, "true"), (annotations::LEASE, "10m")],
            TimeDelta::days(1),
            1,
        ));
        cluster
    }

    #[tokio::test]
    async fn scales_only_expired_workloads() {
        let cluster = sample_cluster();
        let report = WorkloadScanner::new(&cluster, ScanConfig::default())
            .scan(now())
            .await;

        assert!(report.is_success());
        assert_eq!(
            outcomes(&report),
            vec![
                ("api".to_string(), Outcome::ScaledToZero),
                (
                    "worker".to_string(),
                    Outcome::Skipped(SkipReason::LeaseNotExpired)
                ),
                ("cache".to_string(), Outcome::Skipped(SkipReason::Disabled)),
            ]
        );
        assert_eq!(
            cluster.scale_calls(),
            vec![ScaleCall {
                kind: WorkloadKind::Deployment,
                namespace: "apps".to_string(),
                name: "api".to_string(),
            }]
        );
        assert_eq!(
            cluster.replicas_of(WorkloadKind::Deployment, "apps", "api"),
            Some(0)
        );
    }

    #[tokio::test]
    async fn dry_run_trace_matches_live_run() {
        let live_cluster = sample_cluster();
        let live = WorkloadScanner::new(&live_cluster, ScanConfig::new(false))
            .scan(now())
            .await;

        let dry_cluster = sample_cluster();
        let dry = WorkloadScanner::new(&dry_cluster, ScanConfig::new(true))
            .scan(now())
            .await;

        assert_eq!(live.entries(), dry.entries());
        assert_eq!(live_cluster.scale_calls().len(), 1);
        assert!(dry_cluster.scale_calls().is_empty());
        assert_eq!(
            dry_cluster.replicas_of(WorkloadKind::Deployment, "apps", "api"),
            Some(3)
        );
    }

    #[tokio::test]
    async fn second_pass_sees_zero_replicas() {
        let cluster = sample_cluster();
        let scanner = WorkloadScanner::new(&cluster, ScanConfig::default());
        scanner.scan(now()).await;
        let report = scanner.scan(now()).await;

        assert_eq!(
            report.entries()[0].outcome,
            Outcome::Skipped(SkipReason::AlreadyAtZero)
        );
        assert_eq!(cluster.scale_calls().len(), 1);
    }

    #[tokio::test]
    async fn policy_error_does_not_abort() {
        let cluster = MemoryCluster::new();
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "apps",
            "broken",
            &[(annotations::LEASE, "forever")],
            TimeDelta::days(5),
            2,
        ));
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "apps",
            "api",
            &[(annotations::LEASE, "1h")],
            TimeDelta::hours(2),
            3,
        ));

        let report = WorkloadScanner::new(&cluster, ScanConfig::default())
            .scan(now())
            .await;

        assert!(report.is_success());
        assert!(matches!(report.entries()[0].outcome, Outcome::PolicyError(_)));
        assert_eq!(report.entries()[1].outcome, Outcome::ScaledToZero);
        assert_eq!(report.summary().policy_errors, 1);
        assert_eq!(cluster.scale_calls().len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_aborts_immediately() {
        let cluster = MemoryCluster::new();
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "alpha",
            "api",
            &[(annotations::LEASE, "1h")],
            TimeDelta::hours(2),
            3,
        ));
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "beta",
            "web",
            &[(annotations::LEASE, "1h")],
            TimeDelta::hours(2),
            3,
        ));
        cluster.fail_listing(WorkloadKind::StatefulSet, "alpha", "connection refused");

        let report = WorkloadScanner::new(&cluster, ScanConfig::default())
            .scan(now())
            .await;

        assert!(!report.is_success());
        assert!(matches!(
            report.fatal(),
            Some(ScanError::ListWorkloads { kind: WorkloadKind::StatefulSet, .. })
        ));
        // alpha's deployment was already handled; beta is never visited
        assert_eq!(report.namespaces(), ["alpha".to_string()]);
        assert_eq!(report.entries().len(), 1);
        assert_eq!(
            cluster.list_calls(),
            vec![
                (WorkloadKind::Deployment, "alpha".to_string()),
                (WorkloadKind::StatefulSet, "alpha".to_string()),
            ]
        );
        assert_eq!(
            cluster.replicas_of(WorkloadKind::Deployment, "beta", "web"),
            Some(3)
        );
        assert_eq!(report.finish(), std::process::ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn namespace_listing_failure_aborts() {
        let cluster = sample_cluster();
        cluster.fail_namespace_listing("unauthorized");

        let report = WorkloadScanner::new(&cluster, ScanConfig::default())
            .scan(now())
            .await;

        assert!(matches!(report.fatal(), Some(ScanError::ListNamespaces(_))));
        assert!(report.entries().is_empty());
        assert!(cluster.list_calls().is_empty());
    }

    #[tokio::test]
    async fn actuation_failure_aborts_but_keeps_earlier_effects() {
        let cluster = MemoryCluster::new();
        for name in ["first", "second", "third"] {
            cluster.add_workload(make_workload(
                WorkloadKind::Deployment,
                "apps",
                name,
                &[(annotations::LEASE, "1h")],
                TimeDelta::hours(2),
                1,
            ));
        }
        cluster.fail_scaling(WorkloadKind::Deployment, "apps", "second", "forbidden");

        let report = WorkloadScanner::new(&cluster, ScanConfig::default())
            .scan(now())
            .await;

        assert!(matches!(report.fatal(), Some(ScanError::Actuation(_))));
        assert_eq!(
            outcomes(&report),
            vec![
                ("first".to_string(), Outcome::ScaledToZero),
                (
                    "second".to_string(),
                    Outcome::ActuationFailed("cluster unavailable: forbidden".to_string())
                ),
            ]
        );
        assert_eq!(
            cluster.replicas_of(WorkloadKind::Deployment, "apps", "first"),
            Some(0)
        );
        assert_eq!(
            cluster.replicas_of(WorkloadKind::Deployment, "apps", "third"),
            Some(1)
        );
    }

    #[tokio::test]
    async fn kinds_and_exclusions() {
        let cluster = sample_cluster();
        cluster.add_workload(make_workload(
            WorkloadKind::Deployment,
            "kube-system",
            "coredns",
            &[(annotations::LEASE, "1m")],
            TimeDelta::days(1),
            2,
        ));

        let config = ScanConfig::new(false)
            .with_kinds(&[WorkloadKind::StatefulSet])
            .with_excluded_namespaces(vec!["kube-system".to_string()]);
        let report = WorkloadScanner::new(&cluster, config).scan(now()).await;

        assert_eq!(report.excluded(), ["kube-system".to_string()]);
        assert_eq!(
            outcomes(&report),
            vec![("cache".to_string(), Outcome::Skipped(SkipReason::Disabled))]
        );
        assert!(cluster.scale_calls().is_empty());
        assert_eq!(
            cluster.list_calls(),
            vec![(WorkloadKind::StatefulSet, "apps".to_string())]
        );
    }

    #[test]
    fn unrecognized_disabled_ignored_only_past_lease_rules() {
        let unleased = make_workload(
            WorkloadKind::Deployment,
            "apps",
            "plain",
            &[(annotations::DISABLED, "yes")],
            TimeDelta::hours(2),
            3,
        );
        let decision = lease::evaluate(&unleased, now());
        assert_eq!(decision, Decision::Skip(SkipReason::NoLease));
        assert_eq!(ignored_disabled_value(&unleased, &decision), None);

        let leased = make_workload(
            WorkloadKind::Deployment,
            "apps",
            "api",
            &[(annotations::DISABLED, "yes"), (annotations::LEASE, "1h")],
            TimeDelta::hours(2),
            3,
        );
        let decision = lease::evaluate(&leased, now());
        assert_eq!(decision, Decision::Act);
        assert_eq!(ignored_disabled_value(&leased, &decision), Some("yes"));

        let recognized = make_workload(
            WorkloadKind::Deployment,
            "apps",
            "web",
            &[(annotations::DISABLED, "false"), (annotations::LEASE, "1h")],
            TimeDelta::minutes(5),
            3,
        );
        let decision = lease::evaluate(&recognized, now());
        assert_eq!(ignored_disabled_value(&recognized, &decision), None);
    }

    #[test]
    fn kind_order_is_fixed() {
        let config = ScanConfig::default()
            .with_kinds(&[WorkloadKind::StatefulSet, WorkloadKind::Deployment]);
        assert_eq!(
            config.kinds(),
            [WorkloadKind::Deployment, WorkloadKind::StatefulSet]
        );
        assert!(ScanConfig::default().with_kinds(&[]).kinds().is_empty());
    }

    #[tokio::test]
    async fn namespaces_are_traced_in_order() {
        let cluster = MemoryCluster::new();
        cluster.add_namespace("default");
        cluster.add_namespace("apps");
        let report = WorkloadScanner::new(&cluster, ScanConfig::default())
            .scan(now())
            .await;
        assert_eq!(
            report.namespaces(),
            ["default".to_string(), "apps".to_string()]
        );
        assert_eq!(report.finish(), std::process::ExitCode::SUCCESS);
    }
}
