// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use crate::error::{FleetError, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Command line entry point
#[derive(Debug, Parser)]
#[command(name = "eksfleet", version, about = "Discover EKS clusters across AWS profiles and build a kubeconfig")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every cluster with its version skew, as JSON
    List,
    /// Build a kubeconfig for every discovered cluster
    Connect,
    /// Find clusters with the given name in all profiles
    Find { name: String },
}

/// Options consumed read-only by the discovery engine
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Abort when any profile fails credential validation
    #[arg(long, global = true, env = "EKSFLEET_VALIDATE")]
    pub validate: bool,

    /// Region used for global calls (identity, catalog, region listing)
    #[arg(long, global = true, env = "AWS_REGION", default_value = defaults::REGION)]
    pub region: String,

    /// Only scan these regions (still limited to regions enabled per profile)
    #[arg(long, global = true, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Name contexts `<region>:<cluster>` instead of `<account>:<region>:<cluster>`
    #[arg(long, global = true)]
    pub short_names: bool,

    /// Merge the result into the kubeconfig file instead of printing it
    #[arg(long, global = true)]
    pub separate: bool,

    /// Use aws-iam-authenticator instead of the aws CLI for tokens
    #[arg(long, global = true)]
    pub iam_authenticator: bool,

    /// Role name assumed in every cluster account when fetching tokens
    #[arg(long, global = true, env = "EKSFLEET_ROLE_NAME")]
    pub role_name: Option<String>,

    /// Set AWS_PROFILE in generated users
    #[arg(long, global = true)]
    pub env_profile: bool,

    /// Profile used to assume roles that have no source_profile
    #[arg(long, global = true, default_value = defaults::ROLE_SOURCE_PROFILE)]
    pub role_source_profile: String,

    #[arg(long, global = true, default_value = defaults::ROLE_SESSION_NAME)]
    pub role_session_name: String,

    /// Maximum number of provider calls in flight
    #[arg(long, global = true, default_value_t = defaults::MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Deadline for the whole run
    #[arg(long, global = true, default_value_t = defaults::TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[arg(long, global = true, env = "AWS_CONFIG_FILE")]
    pub aws_config_file: Option<PathBuf>,

    #[arg(long, global = true, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub aws_credentials_file: Option<PathBuf>,

    /// Kubeconfig file updated in separate mode
    #[arg(long, global = true, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Write command output to this file instead of stdout
    #[arg(long, short, global = true)]
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            validate: false,
            region: defaults::REGION.to_string(),
            regions: Vec::new(),
            short_names: false,
            separate: false,
            iam_authenticator: false,
            role_name: None,
            env_profile: false,
            role_source_profile: defaults::ROLE_SOURCE_PROFILE.to_string(),
            role_session_name: defaults::ROLE_SESSION_NAME.to_string(),
            max_concurrency: defaults::MAX_CONCURRENCY,
            timeout_secs: defaults::TIMEOUT_SECS,
            aws_config_file: None,
            aws_credentials_file: None,
            kubeconfig: None,
            output: None,
        }
    }
}

impl Config {
    /// The region used for calls that are not bound to a discovered region
    pub fn default_region(&self) -> Result<&str> {
        let region = self.region.trim();
        if region.is_empty() {
            return Err(FleetError::MissingRegion);
        }
        Ok(region)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn aws_config_path(&self) -> Option<PathBuf> {
        self.aws_config_file
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".aws").join("config")))
    }

    pub fn aws_credentials_path(&self) -> Option<PathBuf> {
        self.aws_credentials_file
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".aws").join("credentials")))
    }

    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        // KUBECONFIG may hold a list; the first entry is the one we write
        self.kubeconfig
            .as_ref()
            .and_then(|p| std::env::split_paths(p).next())
            .or_else(|| dirs::home_dir().map(|h| h.join(".kube").join("config")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_rejects_empty() {
        let config = Config {
            region: "  ".to_string(),
            ..Default::default()
        };

        assert!(matches!(config.default_region(), Err(FleetError::MissingRegion)));
    }

    #[test]
    fn test_default_region_trims() {
        let config = Config {
            region: " eu-west-1 ".to_string(),
            ..Default::default()
        };

        assert_eq!(config.default_region().unwrap(), "eu-west-1");
    }

    #[test]
    fn test_cli_parses_global_options() {
        let cli = Cli::try_parse_from([
            "eksfleet",
            "connect",
            "--short-names",
            "--regions",
            "us-east-1,eu-west-1",
            "--role-name",
            "admin",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Connect));
        assert!(cli.config.short_names);
        assert_eq!(cli.config.regions, vec!["us-east-1", "eu-west-1"]);
        assert_eq!(cli.config.role_name.as_deref(), Some("admin"));
    }

    #[test]
    fn test_cli_find_takes_name() {
        let cli = Cli::try_parse_from(["eksfleet", "find", "alpha"]).unwrap();

        match cli.command {
            Command::Find { name } => assert_eq!(name, "alpha"),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
