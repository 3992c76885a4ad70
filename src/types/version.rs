// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Supported Kubernetes version catalog and version skew.

use serde::Serialize;
use std::cmp::Ordering;

/// Distinct supported platform versions plus the latest one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionCatalog {
    versions: Vec<String>,
    latest: String,
}

impl VersionCatalog {
    /// Build a catalog from raw version strings, dropping duplicates and
    /// keeping first-seen order. Returns `None` when nothing is left.
    pub fn from_versions<I, S>(versions: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for version in versions {
            let version = version.into();
            let version = version.trim();
            if version.is_empty() || distinct.iter().any(|v| v == version) {
                continue;
            }
            distinct.push(version.to_string());
        }

        let latest = latest(distinct.as_slice())?.to_string();
        Some(VersionCatalog {
            versions: distinct,
            latest,
        })
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn latest(&self) -> &str {
        &self.latest
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// How many supported releases `installed` is behind the latest one.
    ///
    /// Counts catalog versions newer than `installed` up to and including
    /// the latest. A version the catalog does not know yields `None`.
    pub fn versions_behind(&self, installed: &str) -> Option<usize> {
        let installed = installed.trim();
        if !self.contains(installed) {
            return None;
        }

        Some(
            self.versions
                .iter()
                .filter(|v| {
                    compare_versions(v, installed) == Ordering::Greater
                        && compare_versions(v, &self.latest) != Ordering::Greater
                })
                .count(),
        )
    }
}

/// The highest version in `versions`, independent of input order
pub fn latest<S: AsRef<str>>(versions: &[S]) -> Option<&str> {
    versions
        .iter()
        .map(AsRef::as_ref)
        .max_by(|a, b| compare_versions(a, b))
}

/// Order dotted versions numerically (`1.9 < 1.10`). A leading `v` is
/// ignored, missing components count as zero and equal versions fall back
/// to plain string order so the result is total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = components(a);
    let right = components(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    a.cmp(b)
}

fn components(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}
