// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity store parsing and profile validation.

use super::Discovery;
use crate::constants::sections;
use crate::error::{FleetError, Result};
use crate::provider::CloudProvider;
use crate::types::profile::Profile;
use futures::future::join_all;
use regex::Regex;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, error, info, instrument, warn};

/// One `[section]` of an INI style AWS config or credentials file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The merged contents of the shared AWS config and credentials files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityStore {
    sections: Vec<Section>,
}

impl IdentityStore {
    pub fn parse(text: &str) -> Self {
        let mut store = IdentityStore::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                store.sections.push(Section {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if let Some(section) = store.sections.last_mut() {
                section
                    .entries
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        store.collapse()
    }

    /// Read and merge the given files in order. Missing files are skipped.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut store = IdentityStore::default();
        for path in paths {
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    debug!("Loaded identity store file {}", path.display());
                    store = store.merge(IdentityStore::parse(&text));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Identity store file {} does not exist", path.display());
                }
                Err(e) => {
                    return Err(FleetError::IdentityStore(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Ok(store)
    }

    /// Sections with the same name are combined; keys already present win.
    pub fn merge(mut self, other: IdentityStore) -> Self {
        self.sections.extend(other.sections);
        self.collapse()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn collapse(self) -> Self {
        let mut sections: Vec<Section> = Vec::with_capacity(self.sections.len());
        for section in self.sections {
            match sections.iter_mut().find(|s| s.name == section.name) {
                Some(existing) => {
                    for (key, value) in section.entries {
                        if existing.get(&key).is_none() {
                            existing.entries.push((key, value));
                        }
                    }
                }
                None => sections.push(section),
            }
        }
        IdentityStore { sections }
    }
}

fn role_arn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^arn:[\w-]*:iam::\d+:role/?[\w\-/.]*$").expect("valid role ARN regex")
    })
}

/// Profile name for a section, `None` for sections that are not profiles
fn profile_name(section: &str) -> Option<String> {
    if section == sections::DEFAULT {
        return Some(section.to_string());
    }
    if sections::NON_PROFILE_PREFIXES
        .iter()
        .any(|prefix| section.starts_with(prefix))
    {
        return None;
    }

    let name = section
        .strip_prefix(sections::PROFILE_PREFIX)
        .unwrap_or(section)
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// The role ARN a section assumes, preferring the `role_arn` key
fn role_arn(section: &Section) -> Option<String> {
    let pattern = role_arn_pattern();
    section
        .get("role_arn")
        .filter(|v| pattern.is_match(v))
        .or_else(|| {
            section
                .entries
                .iter()
                .map(|(_, v)| v.as_str())
                .find(|v| pattern.is_match(v))
        })
        .map(str::to_string)
}

/// Turn store sections into profiles, one per distinct name
pub fn profiles_from_store(store: &IdentityStore) -> Vec<Profile> {
    struct Draft {
        name: String,
        conf_profile: String,
        role_arn: Option<String>,
        source_profile: Option<String>,
    }

    let mut drafts: Vec<Draft> = Vec::new();
    for section in store.sections() {
        if section.entries.is_empty() {
            continue;
        }
        let Some(name) = profile_name(&section.name) else {
            continue;
        };

        let role = role_arn(section);
        if let Some(arn) = &role {
            debug!("Profile {} assumes role {}", name, arn);
        }
        let source = section.get("source_profile").map(str::to_string);

        match drafts.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.role_arn = existing.role_arn.take().or(role);
                existing.source_profile = existing.source_profile.take().or(source);
            }
            None => drafts.push(Draft {
                name,
                conf_profile: section.name.clone(),
                role_arn: role,
                source_profile: source,
            }),
        }
    }

    drafts
        .into_iter()
        .map(|d| match d.role_arn {
            Some(arn) => Profile::assume_role(d.name, d.conf_profile, arn, d.source_profile),
            None => Profile::direct(d.name, d.conf_profile),
        })
        .collect()
}

impl<P: CloudProvider> Discovery<P> {
    /// Profiles from the store whose credentials pass an identity check.
    ///
    /// With `strict`, the first failing profile aborts the run. Otherwise
    /// failing profiles are dropped and the rest are returned.
    #[instrument(skip(self, store))]
    pub async fn resolve_profiles(&self, store: &IdentityStore, strict: bool) -> Result<Vec<Profile>> {
        let candidates = profiles_from_store(store);
        info!("Validating {} AWS profiles", candidates.len());

        let outcomes = join_all(candidates.iter().map(|p| self.validate_profile(p))).await;
        self.ensure_active()?;

        let mut valid = Vec::with_capacity(candidates.len());
        for (profile, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => valid.push(profile),
                Err(e) if strict => {
                    return Err(FleetError::ProfileValidation {
                        profile: profile.name,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("Failed to validate credentials of profile {}: {}", profile.name, e);
                    warn!("{} was removed from the list of profiles", profile.name);
                }
            }
        }

        if valid.is_empty() {
            return Err(FleetError::NoProfiles);
        }

        info!("AWS credentials validated, {} profiles in use", valid.len());
        debug!(
            "Profiles in use: {}",
            serde_json::to_string(&valid).unwrap_or_default()
        );
        Ok(valid)
    }

    async fn validate_profile(&self, profile: &Profile) -> Result<()> {
        let region = self.config.default_region()?;
        let credentials = self.credentials_for(profile).await?;
        self.call(
            "GetCallerIdentity",
            self.provider.validate_identity(&credentials, region),
        )
        .await
    }
}
