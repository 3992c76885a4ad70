// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::Serialize;

/// How a profile obtains its credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProfileKind {
    /// Credentials are loaded straight from the named profile
    Direct,
    /// Credentials come from assuming `role_arn`
    #[serde(rename_all = "camelCase")]
    AssumeRole {
        role_arn: String,
        /// Base profile for the exchange, when the store names one
        source_profile: Option<String>,
    },
}

/// A named AWS identity taken from the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    /// Section identifier the profile was first read from, e.g. `profile dev`
    pub conf_profile: String,
    pub kind: ProfileKind,
}

impl Profile {
    pub fn direct(name: impl Into<String>, conf_profile: impl Into<String>) -> Self {
        Profile {
            name: name.into(),
            conf_profile: conf_profile.into(),
            kind: ProfileKind::Direct,
        }
    }

    pub fn assume_role(
        name: impl Into<String>,
        conf_profile: impl Into<String>,
        role_arn: impl Into<String>,
        source_profile: Option<String>,
    ) -> Self {
        Profile {
            name: name.into(),
            conf_profile: conf_profile.into(),
            kind: ProfileKind::AssumeRole {
                role_arn: role_arn.into(),
                source_profile,
            },
        }
    }

    pub fn is_role(&self) -> bool {
        matches!(self.kind, ProfileKind::AssumeRole { .. })
    }

    pub fn role_arn(&self) -> Option<&str> {
        match &self.kind {
            ProfileKind::AssumeRole { role_arn, .. } => Some(role_arn),
            ProfileKind::Direct => None,
        }
    }

    /// Account id of the assumed role, from `arn:<partition>:iam::<account>:role/<name>`
    pub fn role_account(&self) -> Option<&str> {
        self.role_arn()
            .and_then(|arn| arn.split(':').nth(4))
            .filter(|account| !account.is_empty())
    }
}
