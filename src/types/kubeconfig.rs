// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig entries generated for discovered clusters.

use crate::error::{FleetError, Result};
use kube::config::Kubeconfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The provider identity of a cluster, taken from its ARN
/// (`arn:<partition>:eks:<region>:<account>:cluster/<name>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClusterIdentity {
    Arn {
        partition: String,
        region: String,
        account: String,
        name: String,
    },
    /// An identifier that does not look like an EKS cluster ARN
    Raw(String),
}

impl ClusterIdentity {
    pub fn from_arn(arn: &str) -> Self {
        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        if let [prefix, partition, _service, region, account, resource] = parts.as_slice() {
            if let Some(name) = resource.strip_prefix("cluster/") {
                let fields = [partition, region, account, &name];
                if *prefix == "arn" && fields.iter().all(|f| !f.is_empty()) {
                    return ClusterIdentity::Arn {
                        partition: partition.to_string(),
                        region: region.to_string(),
                        account: account.to_string(),
                        name: name.to_string(),
                    };
                }
            }
        }
        ClusterIdentity::Raw(arn.to_string())
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            ClusterIdentity::Arn { account, .. } => Some(account),
            ClusterIdentity::Raw(_) => None,
        }
    }

    /// Name used for the generated cluster, context and user entries:
    /// `<account>:<region>:<name>`, or `<region>:<name>` when `short` is set.
    /// Unparseable identifiers are used as they are.
    pub fn entry_name(&self, short: bool) -> String {
        match self {
            ClusterIdentity::Arn {
                region,
                account,
                name,
                ..
            } => {
                if short {
                    format!("{}:{}", region, name)
                } else {
                    format!("{}:{}:{}", account, region, name)
                }
            }
            ClusterIdentity::Raw(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterIdentity::Arn {
                partition,
                region,
                account,
                name,
            } => write!(f, "arn:{}:eks:{}:{}:cluster/{}", partition, region, account, name),
            ClusterIdentity::Raw(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRef {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Exec credential plugin invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredential {
    pub api_version: String,
    pub command: String,
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecUser {
    pub exec: ExecCredential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEndpoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: ExecUser,
}

/// User, context and cluster entries granting access to one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTriple {
    pub identity: ClusterIdentity,
    pub name: String,
    pub user: ExecUser,
    pub context: ContextRef,
    pub cluster: ClusterEndpoint,
}

/// Deduplicated entries for every reachable cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalConfiguration {
    pub users: Vec<NamedUser>,
    pub contexts: Vec<NamedContext>,
    pub clusters: Vec<NamedCluster>,
    /// Name of the last accepted entry
    pub current_context: Option<String>,
}

impl FinalConfiguration {
    pub fn push(&mut self, triple: ConfigTriple) {
        let name = triple.name;
        self.users.push(NamedUser {
            name: name.clone(),
            user: triple.user,
        });
        self.contexts.push(NamedContext {
            name: name.clone(),
            context: triple.context,
        });
        self.clusters.push(NamedCluster {
            name: name.clone(),
            cluster: triple.cluster,
        });
        self.current_context = Some(name);
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn to_document(&self) -> KubeconfigDocument {
        KubeconfigDocument {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: self.clusters.clone(),
            contexts: self.contexts.clone(),
            users: self.users.clone(),
            current_context: self.current_context.clone(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_document())
            .map_err(|e| FleetError::Serialization(format!("Failed to render kubeconfig: {}", e)))
    }

    /// The configuration as a kube [`Kubeconfig`], ready to merge with others
    pub fn to_kubeconfig(&self) -> Result<Kubeconfig> {
        serde_yaml::to_value(self.to_document())
            .and_then(serde_yaml::from_value)
            .map_err(|e| FleetError::Serialization(format!("Failed to convert kubeconfig: {}", e)))
    }
}

/// Serialized kubeconfig (`kind: Config`) document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeconfigDocument {
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    pub users: Vec<NamedUser>,
    #[serde(rename = "current-context", skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
}
