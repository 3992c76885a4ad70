// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for faking cloud provider responses.

use crate::error::{FleetError, Result};
use crate::kubeconfig::ConfigSink;
use crate::provider::{
    AddonVersion, CloudProvider, ClusterConnection, Credentials, RegionInfo, TemporaryCredentials,
};
use crate::types::kubeconfig::FinalConfiguration;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct FakeCluster {
    name: String,
    version: String,
    account_id: String,
}

/// An in-memory provider. Calls are routed by the identity behind the
/// credentials: the profile name for named profiles, and
/// [`FakeProvider::role_identity`] for credentials from an assumed role.
#[derive(Debug, Default)]
pub struct FakeProvider {
    catalog: Vec<String>,
    catalog_fails: bool,
    regions: HashMap<String, Vec<RegionInfo>>,
    clusters: HashMap<(String, String), Vec<FakeCluster>>,
    invalid_identities: HashSet<String>,
    failing_roles: HashSet<String>,
    failing_regions: HashSet<String>,
    stalled_regions: HashSet<String>,
    failing_clusters: HashSet<(String, String)>,
    failing_describes: HashSet<String>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity_of(credentials: &Credentials) -> String {
        match credentials {
            Credentials::Profile(name) => name.clone(),
            Credentials::Temporary(temporary) => temporary.access_key_id.clone(),
        }
    }

    pub fn role_identity(role_arn: &str) -> String {
        format!("assumed:{}", role_arn)
    }

    /// Cluster versions reported by the addon catalog, for any identity
    pub fn with_catalog(mut self, versions: &[&str]) -> Self {
        self.catalog = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_regions(mut self, identity: &str, regions: &[(&str, &str)]) -> Self {
        let known = self.regions.entry(identity.to_string()).or_default();
        for (name, status) in regions {
            known.retain(|r| r.name != *name);
            known.push(RegionInfo {
                name: name.to_string(),
                opt_in_status: Some(status.to_string()),
            });
        }
        self
    }

    /// Add a cluster, enabling its region for the identity when not yet known
    pub fn with_cluster(
        mut self,
        identity: &str,
        region: &str,
        name: &str,
        version: &str,
        account_id: &str,
    ) -> Self {
        let known = self.regions.entry(identity.to_string()).or_default();
        if !known.iter().any(|r| r.name == region) {
            known.push(RegionInfo {
                name: region.to_string(),
                opt_in_status: Some("opt-in-not-required".to_string()),
            });
        }

        self.clusters
            .entry((identity.to_string(), region.to_string()))
            .or_default()
            .push(FakeCluster {
                name: name.to_string(),
                version: version.to_string(),
                account_id: account_id.to_string(),
            });
        self
    }

    pub fn failing_validation(mut self, identity: &str) -> Self {
        self.invalid_identities.insert(identity.to_string());
        self
    }

    pub fn failing_assume_role(mut self, role_arn: &str) -> Self {
        self.failing_roles.insert(role_arn.to_string());
        self
    }

    pub fn failing_regions(mut self, identity: &str) -> Self {
        self.failing_regions.insert(identity.to_string());
        self
    }

    /// Region lookups for the identity never complete
    pub fn stalled_regions(mut self, identity: &str) -> Self {
        self.stalled_regions.insert(identity.to_string());
        self
    }

    pub fn failing_clusters(mut self, identity: &str, region: &str) -> Self {
        self.failing_clusters
            .insert((identity.to_string(), region.to_string()));
        self
    }

    pub fn failing_describe(mut self, cluster: &str) -> Self {
        self.failing_describes.insert(cluster.to_string());
        self
    }

    pub fn failing_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    fn find_cluster(&self, credentials: &Credentials, region: &str, cluster: &str) -> Result<FakeCluster> {
        if self.failing_describes.contains(cluster) {
            return Err(FleetError::provider("DescribeCluster", "ResourceNotFoundException"));
        }
        let key = (Self::identity_of(credentials), region.to_string());
        self.clusters
            .get(&key)
            .and_then(|clusters| clusters.iter().find(|c| c.name == cluster))
            .cloned()
            .ok_or_else(|| {
                FleetError::provider("DescribeCluster", format!("No cluster found for name: {}", cluster))
            })
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    async fn validate_identity(&self, credentials: &Credentials, _region: &str) -> Result<()> {
        let identity = Self::identity_of(credentials);
        if self.invalid_identities.contains(&identity) {
            return Err(FleetError::provider("GetCallerIdentity", "InvalidClientTokenId"));
        }
        Ok(())
    }

    async fn assume_role(
        &self,
        _credentials: &Credentials,
        _region: &str,
        role_arn: &str,
        _session_name: &str,
    ) -> Result<Credentials> {
        if self.failing_roles.contains(role_arn) {
            return Err(FleetError::provider("AssumeRole", "AccessDenied"));
        }
        Ok(Credentials::Temporary(TemporaryCredentials {
            access_key_id: Self::role_identity(role_arn),
            secret_access_key: "secret".to_string(),
            session_token: Some("token".to_string()),
        }))
    }

    async fn list_regions(&self, credentials: &Credentials, _region: &str) -> Result<Vec<RegionInfo>> {
        let identity = Self::identity_of(credentials);
        if self.stalled_regions.contains(&identity) {
            return futures::future::pending().await;
        }
        if self.failing_regions.contains(&identity) {
            return Err(FleetError::provider("DescribeRegions", "UnauthorizedOperation"));
        }
        Ok(self.regions.get(&identity).cloned().unwrap_or_default())
    }

    async fn addon_versions(&self, _credentials: &Credentials, _region: &str) -> Result<Vec<AddonVersion>> {
        if self.catalog_fails {
            return Err(FleetError::provider("DescribeAddonVersions", "AccessDeniedException"));
        }
        if self.catalog.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![AddonVersion {
            cluster_versions: self.catalog.clone(),
        }])
    }

    async fn list_cluster_names(&self, credentials: &Credentials, region: &str) -> Result<Vec<String>> {
        let key = (Self::identity_of(credentials), region.to_string());
        if self.failing_clusters.contains(&key) {
            return Err(FleetError::provider("ListClusters", "AccessDeniedException"));
        }
        Ok(self
            .clusters
            .get(&key)
            .map(|clusters| clusters.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default())
    }

    async fn describe_cluster_version(
        &self,
        credentials: &Credentials,
        region: &str,
        cluster: &str,
    ) -> Result<String> {
        Ok(self.find_cluster(credentials, region, cluster)?.version)
    }

    async fn describe_cluster_connection(
        &self,
        credentials: &Credentials,
        region: &str,
        cluster: &str,
    ) -> Result<ClusterConnection> {
        let found = self.find_cluster(credentials, region, cluster)?;
        Ok(ClusterConnection {
            arn: format!("arn:aws:eks:{}:{}:cluster/{}", region, found.account_id, found.name),
            endpoint: format!("https://{}.{}.eks.amazonaws.com", found.name, region),
            certificate_authority_data: "Q0EK".to_string(),
            name: found.name,
        })
    }
}

/// Sink that keeps every configuration handed to it
#[derive(Debug, Default)]
pub struct RecordingSink {
    persisted: Mutex<Vec<FinalConfiguration>>,
}

impl RecordingSink {
    pub fn persisted(&self) -> Vec<FinalConfiguration> {
        self.persisted.lock().unwrap().clone()
    }
}

impl ConfigSink for RecordingSink {
    fn persist(&self, config: &FinalConfiguration) -> Result<()> {
        self.persisted.lock().unwrap().push(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_calls_by_identity() {
        let provider = FakeProvider::new()
            .with_cluster("dev", "us-east-1", "alpha", "1.29", "111111111111")
            .with_cluster("prod", "us-east-1", "beta", "1.30", "222222222222");
        let dev = Credentials::Profile("dev".to_string());

        let names = provider.list_cluster_names(&dev, "us-east-1").await.unwrap();
        assert_eq!(names, vec!["alpha"]);

        let regions = provider.list_regions(&dev, "us-east-1").await.unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].opt_in_status.as_deref(), Some("opt-in-not-required"));

        assert!(provider
            .describe_cluster_version(&dev, "us-east-1", "beta")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_assumed_role_routes_to_role_identity() {
        let arn = "arn:aws:iam::111111111111:role/ops";
        let provider = FakeProvider::new().with_cluster(
            &FakeProvider::role_identity(arn),
            "us-east-1",
            "alpha",
            "1.29",
            "111111111111",
        );

        let creds = provider
            .assume_role(&Credentials::Profile("default".to_string()), "us-east-1", arn, "test")
            .await
            .unwrap();
        let connection = provider
            .describe_cluster_connection(&creds, "us-east-1", "alpha")
            .await
            .unwrap();

        assert_eq!(connection.arn, "arn:aws:eks:us-east-1:111111111111:cluster/alpha");
        assert_eq!(connection.endpoint, "https://alpha.us-east-1.eks.amazonaws.com");
    }
}
