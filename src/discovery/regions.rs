// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Discovery;
use crate::constants::opt_in;
use crate::provider::{CloudProvider, Credentials, RegionInfo};
use crate::types::profile::Profile;
use tracing::{debug, instrument, warn};

/// Region names usable by the identity, optionally limited to `only`
pub fn enabled_regions(regions: Vec<RegionInfo>, only: &[String]) -> Vec<String> {
    regions
        .into_iter()
        .filter(|r| {
            matches!(
                r.opt_in_status.as_deref(),
                Some(opt_in::OPTED_IN) | Some(opt_in::NOT_REQUIRED)
            )
        })
        .map(|r| r.name)
        .filter(|name| only.is_empty() || only.iter().any(|o| o == name))
        .collect()
}

impl<P: CloudProvider> Discovery<P> {
    /// Regions enabled for the profile. Lookup failures yield no regions.
    #[instrument(skip_all, fields(profile = %profile.name))]
    pub async fn list_regions(&self, profile: &Profile, credentials: &Credentials) -> Vec<String> {
        let region = match self.config.default_region() {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping profile {}: {}", profile.name, e);
                return Vec::new();
            }
        };

        match self
            .call("DescribeRegions", self.provider.list_regions(credentials, region))
            .await
        {
            Ok(regions) => {
                let enabled = enabled_regions(regions, &self.config.regions);
                debug!("Profile {} has {} enabled regions", profile.name, enabled.len());
                enabled
            }
            Err(e) => {
                warn!("Skipping profile {}: failed to get region info: {}", profile.name, e);
                Vec::new()
            }
        }
    }
}
