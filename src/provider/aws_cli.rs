// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! [`CloudProvider`] backed by the `aws` command line tool.

use super::{AddonVersion, CloudProvider, ClusterConnection, Credentials, RegionInfo, TemporaryCredentials};
use crate::error::{FleetError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

const DEFAULT_BINARY: &str = "aws";

/// Runs `aws ... --output json` and decodes the response
#[derive(Debug, Clone)]
pub struct AwsCliProvider {
    binary: String,
}

impl Default for AwsCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsCliProvider {
    pub fn new() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
        }
    }

    #[instrument(skip(self, credentials, service_args))]
    async fn run<T: DeserializeOwned>(
        &self,
        operation: &str,
        credentials: &Credentials,
        region: &str,
        service_args: &[&str],
    ) -> Result<T> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(command_args(credentials, region, service_args))
            .kill_on_drop(true);

        if let Credentials::Temporary(temp) = credentials {
            cmd.env_remove("AWS_PROFILE")
                .env("AWS_ACCESS_KEY_ID", &temp.access_key_id)
                .env("AWS_SECRET_ACCESS_KEY", &temp.secret_access_key);
            match &temp.session_token {
                Some(token) => {
                    cmd.env("AWS_SESSION_TOKEN", token);
                }
                None => {
                    cmd.env_remove("AWS_SESSION_TOKEN");
                }
            }
        }

        debug!("Running {} {}", self.binary, service_args.join(" "));

        let output = cmd.output().await.map_err(|e| {
            FleetError::provider(operation, format!("failed to run {}: {}", self.binary, e))
        })?;

        if !output.status.success() {
            return Err(FleetError::provider(
                operation,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        decode(operation, &output.stdout)
    }
}

/// Global arguments followed by the service command
fn command_args(credentials: &Credentials, region: &str, service_args: &[&str]) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(service_args.len() + 6);
    if let Credentials::Profile(profile) = credentials {
        args.push("--profile".to_string());
        args.push(profile.clone());
    }
    args.push("--region".to_string());
    args.push(region.to_string());
    args.push("--output".to_string());
    args.push("json".to_string());
    args.extend(service_args.iter().map(|a| a.to_string()));
    args
}

fn decode<T: DeserializeOwned>(operation: &str, stdout: &[u8]) -> Result<T> {
    serde_json::from_slice(stdout)
        .map_err(|e| FleetError::provider(operation, format!("unexpected response: {}", e)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: Option<String>,
    arn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: AssumedCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumedCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRegionsResponse {
    #[serde(default)]
    regions: Vec<RegionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegionEntry {
    region_name: Option<String>,
    opt_in_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeAddonVersionsResponse {
    #[serde(default)]
    addons: Vec<AddonEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonEntry {
    #[serde(default)]
    addon_versions: Vec<AddonVersionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonVersionEntry {
    #[serde(default)]
    compatibilities: Vec<Compatibility>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Compatibility {
    cluster_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListClustersResponse {
    #[serde(default)]
    clusters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeClusterResponse {
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterEntry {
    name: Option<String>,
    arn: Option<String>,
    version: Option<String>,
    endpoint: Option<String>,
    certificate_authority: Option<CertificateAuthority>,
}

#[derive(Debug, Deserialize)]
struct CertificateAuthority {
    data: Option<String>,
}

fn flatten_addons(response: DescribeAddonVersionsResponse) -> Vec<AddonVersion> {
    response
        .addons
        .into_iter()
        .flat_map(|addon| addon.addon_versions)
        .map(|v| AddonVersion {
            cluster_versions: v
                .compatibilities
                .into_iter()
                .filter_map(|c| c.cluster_version)
                .collect(),
        })
        .collect()
}

fn into_connection(cluster: &str, entry: ClusterEntry) -> Result<ClusterConnection> {
    let missing = |field: &str| {
        FleetError::provider(
            "DescribeCluster",
            format!("cluster {} has no {}", cluster, field),
        )
    };

    Ok(ClusterConnection {
        name: entry.name.unwrap_or_else(|| cluster.to_string()),
        arn: entry.arn.ok_or_else(|| missing("arn"))?,
        endpoint: entry.endpoint.ok_or_else(|| missing("endpoint"))?,
        certificate_authority_data: entry
            .certificate_authority
            .and_then(|ca| ca.data)
            .ok_or_else(|| missing("certificate authority data"))?,
    })
}

#[async_trait]
impl CloudProvider for AwsCliProvider {
    async fn validate_identity(&self, credentials: &Credentials, region: &str) -> Result<()> {
        let identity: CallerIdentity = self
            .run("GetCallerIdentity", credentials, region, &["sts", "get-caller-identity"])
            .await?;
        debug!(
            "Caller identity {} in account {}",
            identity.arn.unwrap_or_default(),
            identity.account.unwrap_or_default()
        );
        Ok(())
    }

    async fn assume_role(
        &self,
        credentials: &Credentials,
        region: &str,
        role_arn: &str,
        session_name: &str,
    ) -> Result<Credentials> {
        let response: AssumeRoleResponse = self
            .run(
                "AssumeRole",
                credentials,
                region,
                &[
                    "sts",
                    "assume-role",
                    "--role-arn",
                    role_arn,
                    "--role-session-name",
                    session_name,
                ],
            )
            .await?;

        Ok(Credentials::Temporary(TemporaryCredentials {
            access_key_id: response.credentials.access_key_id,
            secret_access_key: response.credentials.secret_access_key,
            session_token: response.credentials.session_token,
        }))
    }

    async fn list_regions(&self, credentials: &Credentials, region: &str) -> Result<Vec<RegionInfo>> {
        let response: DescribeRegionsResponse = self
            .run(
                "DescribeRegions",
                credentials,
                region,
                &["ec2", "describe-regions", "--all-regions"],
            )
            .await?;

        Ok(response
            .regions
            .into_iter()
            .filter_map(|r| {
                r.region_name.map(|name| RegionInfo {
                    name,
                    opt_in_status: r.opt_in_status,
                })
            })
            .collect())
    }

    async fn addon_versions(&self, credentials: &Credentials, region: &str) -> Result<Vec<AddonVersion>> {
        let response: DescribeAddonVersionsResponse = self
            .run(
                "DescribeAddonVersions",
                credentials,
                region,
                &["eks", "describe-addon-versions"],
            )
            .await?;

        Ok(flatten_addons(response))
    }

    async fn list_cluster_names(&self, credentials: &Credentials, region: &str) -> Result<Vec<String>> {
        let response: ListClustersResponse = self
            .run("ListClusters", credentials, region, &["eks", "list-clusters"])
            .await?;

        Ok(response.clusters)
    }

    async fn describe_cluster_version(
        &self,
        credentials: &Credentials,
        region: &str,
        cluster: &str,
    ) -> Result<String> {
        let response: DescribeClusterResponse = self
            .run(
                "DescribeCluster",
                credentials,
                region,
                &["eks", "describe-cluster", "--name", cluster],
            )
            .await?;

        response.cluster.version.ok_or_else(|| {
            FleetError::provider("DescribeCluster", format!("cluster {} has no version", cluster))
        })
    }

    async fn describe_cluster_connection(
        &self,
        credentials: &Credentials,
        region: &str,
        cluster: &str,
    ) -> Result<ClusterConnection> {
        let response: DescribeClusterResponse = self
            .run(
                "DescribeCluster",
                credentials,
                region,
                &["eks", "describe-cluster", "--name", cluster],
            )
            .await?;

        into_connection(cluster, response.cluster)
    }
}
