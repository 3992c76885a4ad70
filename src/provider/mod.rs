// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cloud provider boundary used by the discovery engine.
//!
//! Every call the engine makes against the cloud goes through
//! [`CloudProvider`]. [`AwsCliProvider`] implements it on top of the `aws`
//! command line tool.

mod aws_cli;

pub use aws_cli::AwsCliProvider;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Temporary credentials returned by a role assumption
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Credentials a provider call runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A profile from the shared config/credentials files
    Profile(String),
    Temporary(TemporaryCredentials),
}

/// A region and its opt-in state for the calling identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub name: String,
    pub opt_in_status: Option<String>,
}

/// Cluster versions supported by one addon release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonVersion {
    pub cluster_versions: Vec<String>,
}

/// Connection details of a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConnection {
    pub name: String,
    pub arn: String,
    pub endpoint: String,
    pub certificate_authority_data: String,
}

#[async_trait]
pub trait CloudProvider: Send + Sync + 'static {
    /// Check that the credentials belong to a valid identity
    async fn validate_identity(&self, credentials: &Credentials, region: &str) -> Result<()>;

    async fn assume_role(
        &self,
        credentials: &Credentials,
        region: &str,
        role_arn: &str,
        session_name: &str,
    ) -> Result<Credentials>;

    /// Every region known to the provider, with its opt-in state
    async fn list_regions(&self, credentials: &Credentials, region: &str)
        -> Result<Vec<RegionInfo>>;

    async fn addon_versions(&self, credentials: &Credentials, region: &str)
        -> Result<Vec<AddonVersion>>;

    async fn list_cluster_names(&self, credentials: &Credentials, region: &str)
        -> Result<Vec<String>>;

    async fn describe_cluster_version(
        &self,
        credentials: &Credentials,
        region: &str,
        cluster: &str,
    ) -> Result<String>;

    async fn describe_cluster_connection(
        &self,
        credentials: &Credentials,
        region: &str,
        cluster: &str,
    ) -> Result<ClusterConnection>;
}
