// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Discovery;
use crate::provider::{CloudProvider, Credentials};
use crate::types::cluster::ClusterRecord;
use crate::types::version::VersionCatalog;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

impl<P: CloudProvider> Discovery<P> {
    /// Clusters in one region of an account, annotated with version skew.
    ///
    /// Versions are fetched concurrently, one task per cluster. Any failure
    /// while listing or describing leaves the region empty.
    #[instrument(skip_all, fields(profile = %account, region = %region))]
    pub async fn list_clusters_in_region(
        &self,
        account: &str,
        credentials: &Credentials,
        region: &str,
        catalog: Arc<VersionCatalog>,
    ) -> Vec<ClusterRecord> {
        let names = match self
            .call("ListClusters", self.provider.list_cluster_names(credentials, region))
            .await
        {
            Ok(names) => names,
            Err(e) => {
                warn!(
                    "Skipping region {} for profile {}: failed to list clusters: {}",
                    region, account, e
                );
                return Vec::new();
            }
        };

        debug!("Found {} clusters in region {} with profile {}", names.len(), region, account);
        if names.is_empty() {
            return Vec::new();
        }

        let (tx, mut rx) = mpsc::channel(names.len());
        for name in names.iter().cloned() {
            let tx = tx.clone();
            let discovery = self.clone();
            let credentials = credentials.clone();
            let region = region.to_string();

            tokio::spawn(async move {
                let version = discovery
                    .call(
                        "DescribeCluster",
                        discovery
                            .provider
                            .describe_cluster_version(&credentials, &region, &name),
                    )
                    .await;
                let _ = tx.send((name, version)).await;
            });
        }
        drop(tx);

        let mut records = Vec::with_capacity(names.len());
        for _ in 0..names.len() {
            let Some((name, version)) = rx.recv().await else {
                warn!(
                    "Skipping region {} for profile {}: a version lookup did not report back",
                    region, account
                );
                return Vec::new();
            };

            match version {
                Ok(version) => records.push(ClusterRecord {
                    versions_behind: catalog.versions_behind(&version),
                    latest: catalog.latest().to_string(),
                    name,
                    version,
                    region: region.to_string(),
                    account: account.to_string(),
                }),
                Err(e) => {
                    warn!(
                        "Skipping region {} for profile {}: failed to describe cluster {}: {}",
                        region, account, name, e
                    );
                    return Vec::new();
                }
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::FakeProvider;

    fn make_catalog() -> Arc<VersionCatalog> {
        Arc::new(VersionCatalog::from_versions(["1.27", "1.28", "1.29", "1.30"]).unwrap())
    }

    fn dev() -> Credentials {
        Credentials::Profile("dev".to_string())
    }

    #[tokio::test]
    async fn test_cluster_record_has_skew() {
        let provider = FakeProvider::new().with_cluster("dev", "us-east-1", "alpha", "1.27", "111111111111");
        let discovery = Discovery::new(provider, Config::default());

        let records = discovery
            .list_clusters_in_region("dev", &dev(), "us-east-1", make_catalog())
            .await;

        assert_eq!(
            records,
            vec![ClusterRecord {
                name: "alpha".to_string(),
                version: "1.27".to_string(),
                latest: "1.30".to_string(),
                region: "us-east-1".to_string(),
                versions_behind: Some(3),
                account: "dev".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_all_clusters_in_region_are_described() {
        let provider = FakeProvider::new()
            .with_cluster("dev", "us-east-1", "alpha", "1.27", "111111111111")
            .with_cluster("dev", "us-east-1", "beta", "1.30", "111111111111")
            .with_cluster("dev", "us-east-1", "legacy", "1.21", "111111111111");
        let discovery = Discovery::new(provider, Config::default());

        let mut records = discovery
            .list_clusters_in_region("dev", &dev(), "us-east-1", make_catalog())
            .await;
        records.sort_by(|a, b| a.name.cmp(&b.name));

        let skew: Vec<_> = records
            .iter()
            .map(|r| (r.name.as_str(), r.versions_behind))
            .collect();
        assert_eq!(skew, vec![("alpha", Some(3)), ("beta", Some(0)), ("legacy", None)]);
    }

    #[tokio::test]
    async fn test_list_failure_yields_empty_region() {
        let provider = FakeProvider::new()
            .with_cluster("dev", "us-east-1", "alpha", "1.27", "111111111111")
            .failing_clusters("dev", "us-east-1");
        let discovery = Discovery::new(provider, Config::default());

        let records = discovery
            .list_clusters_in_region("dev", &dev(), "us-east-1", make_catalog())
            .await;

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_describe_failure_yields_empty_region() {
        let provider = FakeProvider::new()
            .with_cluster("dev", "us-east-1", "alpha", "1.27", "111111111111")
            .with_cluster("dev", "us-east-1", "beta", "1.28", "111111111111")
            .failing_describe("beta");
        let discovery = Discovery::new(provider, Config::default());

        let records = discovery
            .list_clusters_in_region("dev", &dev(), "us-east-1", make_catalog())
            .await;

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_bounded_concurrency_still_completes() {
        let mut provider = FakeProvider::new();
        for i in 0..20 {
            provider = provider.with_cluster("dev", "us-east-1", &format!("c{}", i), "1.29", "111111111111");
        }
        let config = Config {
            max_concurrency: 1,
            ..Default::default()
        };
        let discovery = Discovery::new(provider, config);

        let records = discovery
            .list_clusters_in_region("dev", &dev(), "us-east-1", make_catalog())
            .await;

        assert_eq!(records.len(), 20);
    }
}
