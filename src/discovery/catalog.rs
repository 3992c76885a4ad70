// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Discovery;
use crate::error::{FleetError, Result};
use crate::provider::{AddonVersion, CloudProvider};
use crate::types::profile::Profile;
use crate::types::version::VersionCatalog;
use tracing::{info, instrument};

/// Cluster versions supported by any addon release, first-seen order
pub fn catalog_from_addons(addons: &[AddonVersion]) -> Option<VersionCatalog> {
    VersionCatalog::from_versions(
        addons
            .iter()
            .flat_map(|a| a.cluster_versions.iter().map(String::as_str)),
    )
}

impl<P: CloudProvider> Discovery<P> {
    /// Build the supported version catalog. Any failure is fatal.
    #[instrument(skip_all, fields(profile = %profile.name))]
    pub async fn build_catalog(&self, profile: &Profile) -> Result<VersionCatalog> {
        let region = self.config.default_region()?;
        let missing = |message: String| FleetError::MissingCatalog {
            profile: profile.name.clone(),
            message,
        };

        let addons = match self.fetch_addons(profile, region).await {
            Ok(addons) => addons,
            Err(e) => {
                self.ensure_active()?;
                return Err(missing(e.to_string()));
            }
        };

        let catalog = catalog_from_addons(&addons)
            .ok_or_else(|| missing("no supported cluster versions reported".to_string()))?;
        info!(
            "Supported EKS versions: {}, latest {}",
            catalog.versions().join(", "),
            catalog.latest()
        );
        Ok(catalog)
    }

    async fn fetch_addons(&self, profile: &Profile, region: &str) -> Result<Vec<AddonVersion>> {
        let credentials = self.credentials_for(profile).await?;
        self.call(
            "DescribeAddonVersions",
            self.provider.addon_versions(&credentials, region),
        )
        .await
    }
}
