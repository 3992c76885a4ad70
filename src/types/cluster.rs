// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::PROVIDER_NAME;
use serde::Serialize;

/// An EKS cluster found in one account and region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    pub name: String,
    pub version: String,
    pub latest: String,
    pub region: String,
    /// Supported releases between the installed version and the latest,
    /// `None` when the installed version is not in the catalog
    pub versions_behind: Option<usize>,
    /// Profile the cluster was found with
    pub account: String,
}

/// Every cluster found with one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResult {
    pub name: String,
    pub clusters: Vec<ClusterRecord>,
    pub count: usize,
}

impl AccountResult {
    pub fn new(name: impl Into<String>, clusters: Vec<ClusterRecord>) -> Self {
        let count = clusters.len();
        AccountResult {
            name: name.into(),
            clusters,
            count,
        }
    }
}

/// Discovery result across all profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub provider: String,
    pub accounts: Vec<AccountResult>,
    pub total: usize,
}

impl Inventory {
    pub fn new(accounts: Vec<AccountResult>) -> Self {
        let total = accounts.iter().map(|a| a.count).sum();
        Inventory {
            provider: PROVIDER_NAME.to_string(),
            accounts,
            total,
        }
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterRecord> {
        self.accounts.iter().flat_map(|a| a.clusters.iter())
    }
}
