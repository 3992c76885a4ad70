// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fan-out over profiles and regions, fan-in of their clusters.

use super::{Discovery, IdentityStore};
use crate::error::{FleetError, Result};
use crate::provider::CloudProvider;
use crate::types::cluster::{AccountResult, ClusterRecord, Inventory};
use crate::types::profile::Profile;
use crate::types::version::VersionCatalog;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Everything one discovery run produced
#[derive(Debug, Clone)]
pub struct DiscoveryRun {
    pub profiles: Vec<Profile>,
    pub catalog: Arc<VersionCatalog>,
    pub inventory: Inventory,
}

impl<P: CloudProvider> Discovery<P> {
    /// Resolve profiles, build the catalog with the first one and discover
    /// clusters with all of them
    pub async fn discover(&self, store: &IdentityStore) -> Result<DiscoveryRun> {
        self.config.default_region()?;

        let profiles = self.resolve_profiles(store, self.config.validate).await?;
        let first = profiles.first().ok_or(FleetError::NoProfiles)?;
        let catalog = Arc::new(self.build_catalog(first).await?);

        let accounts = self.discover_all(&profiles, Arc::clone(&catalog)).await?;
        let inventory = Inventory::new(accounts);
        info!(
            "Found {} clusters in {} accounts",
            inventory.total,
            inventory.accounts.len()
        );

        Ok(DiscoveryRun {
            profiles,
            catalog,
            inventory,
        })
    }

    /// Every cluster with the given name, across all profiles and regions
    pub async fn find_cluster(&self, store: &IdentityStore, name: &str) -> Result<Vec<ClusterRecord>> {
        info!("Searching all AWS profiles for cluster {}", name);
        let run = self.discover(store).await?;

        Ok(run
            .inventory
            .clusters()
            .filter(|c| c.name == name)
            .cloned()
            .collect())
    }

    /// One task per profile, each fanning out per region. Accounts without
    /// clusters are left out; result order follows completion order.
    #[instrument(skip_all, fields(profiles = profiles.len()))]
    pub async fn discover_all(
        &self,
        profiles: &[Profile],
        catalog: Arc<VersionCatalog>,
    ) -> Result<Vec<AccountResult>> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let (tx, mut rx) = mpsc::channel(profiles.len());
        for profile in profiles.iter().cloned() {
            let tx = tx.clone();
            let discovery = self.clone();
            let catalog = Arc::clone(&catalog);

            tokio::spawn(async move {
                let account = discovery.discover_profile(profile, catalog).await;
                let _ = tx.send(account).await;
            });
        }
        drop(tx);

        let mut accounts = Vec::new();
        for _ in 0..profiles.len() {
            match rx.recv().await {
                Some(account) if account.count > 0 => accounts.push(account),
                Some(account) => debug!("Profile {} has no clusters", account.name),
                None => {
                    warn!("A profile task ended without reporting its clusters");
                    break;
                }
            }
        }

        self.ensure_active()?;
        Ok(accounts)
    }

    #[instrument(skip_all, fields(profile = %profile.name))]
    async fn discover_profile(&self, profile: Profile, catalog: Arc<VersionCatalog>) -> AccountResult {
        info!("Using AWS profile: {}", profile.name);

        let credentials = match self.credentials_for(&profile).await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Skipping profile {}: {}", profile.name, e);
                return AccountResult::new(profile.name, Vec::new());
            }
        };

        let regions = self.list_regions(&profile, &credentials).await;
        if regions.is_empty() {
            return AccountResult::new(profile.name, Vec::new());
        }

        let (tx, mut rx) = mpsc::channel(regions.len());
        for region in regions.iter().cloned() {
            let tx = tx.clone();
            let discovery = self.clone();
            let account = profile.name.clone();
            let credentials = credentials.clone();
            let catalog = Arc::clone(&catalog);

            tokio::spawn(async move {
                let clusters = discovery
                    .list_clusters_in_region(&account, &credentials, &region, catalog)
                    .await;
                let _ = tx.send(clusters).await;
            });
        }
        drop(tx);

        let mut clusters = Vec::new();
        for _ in 0..regions.len() {
            match rx.recv().await {
                Some(mut found) => clusters.append(&mut found),
                None => {
                    warn!("A region task of profile {} ended without reporting", profile.name);
                    break;
                }
            }
        }

        AccountResult::new(profile.name, clusters)
    }
}
