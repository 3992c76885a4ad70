// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Provider name reported in inventories
pub const PROVIDER_NAME: &str = "aws";

/// Defaults copied into `Config` when nothing else is given
pub mod defaults {
    pub const REGION: &str = "us-east-1";
    /// Profile whose credentials are used to assume roles without a `source_profile`
    pub const ROLE_SOURCE_PROFILE: &str = "default";
    pub const ROLE_SESSION_NAME: &str = "eksfleet";
    pub const MAX_CONCURRENCY: usize = 32;
    pub const TIMEOUT_SECS: u64 = 300;
}

/// Region opt-in states that make a region usable for an identity
pub mod opt_in {
    pub const OPTED_IN: &str = "opted-in";
    pub const NOT_REQUIRED: &str = "opt-in-not-required";
}

/// Exec credential plugin settings written into generated users
pub mod exec {
    pub const API_VERSION: &str = "client.authentication.k8s.io/v1beta1";
    pub const AWS_CLI: &str = "aws";
    pub const IAM_AUTHENTICATOR: &str = "aws-iam-authenticator";
    pub const PROFILE_ENV: &str = "AWS_PROFILE";
}

/// Identity store section prefixes
pub mod sections {
    pub const PROFILE_PREFIX: &str = "profile ";
    pub const DEFAULT: &str = "default";
    /// Sections that never describe a profile
    pub const NON_PROFILE_PREFIXES: &[&str] = &["sso-session ", "services "];
}
