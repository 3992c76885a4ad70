// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::ConfigSink;
use crate::config::Config;
use crate::constants::exec;
use crate::discovery::Discovery;
use crate::error::{FleetError, Result};
use crate::provider::{CloudProvider, ClusterConnection};
use crate::types::cluster::AccountResult;
use crate::types::kubeconfig::{
    ClusterEndpoint, ClusterIdentity, ConfigTriple, ContextRef, EnvVar, ExecCredential, ExecUser,
    FinalConfiguration,
};
use crate::types::profile::Profile;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Kubeconfig entries for one cluster reached through `profile`.
///
/// The token role lives in the cluster's account; when the cluster ARN does
/// not name one, the account of the profile's own role is used.
pub fn build_triple(
    config: &Config,
    profile: &Profile,
    region: &str,
    connection: &ClusterConnection,
) -> ConfigTriple {
    let identity = ClusterIdentity::from_arn(&connection.arn);
    let name = identity.entry_name(config.short_names);

    let role_arn = config.role_name.as_deref().and_then(|role| {
        match identity.account().or_else(|| profile.role_account()) {
            Some(account) => Some(format!("arn:aws:iam::{}:role/{}", account, role)),
            None => {
                warn!(
                    "No account known for cluster {}, token for {} will not assume role {}",
                    identity, name, role
                );
                None
            }
        }
    });

    let (command, mut args) = if config.iam_authenticator {
        (
            exec::IAM_AUTHENTICATOR,
            vec!["token".to_string(), "-i".to_string(), connection.name.clone()],
        )
    } else {
        (
            exec::AWS_CLI,
            vec![
                "--region".to_string(),
                region.to_string(),
                "eks".to_string(),
                "get-token".to_string(),
                "--cluster-name".to_string(),
                connection.name.clone(),
            ],
        )
    };
    if let Some(role_arn) = role_arn {
        args.push("--role-arn".to_string());
        args.push(role_arn);
    }

    let env = config.env_profile.then(|| {
        vec![EnvVar {
            name: exec::PROFILE_ENV.to_string(),
            value: profile.name.clone(),
        }]
    });

    ConfigTriple {
        identity,
        user: ExecUser {
            exec: ExecCredential {
                api_version: exec::API_VERSION.to_string(),
                command: command.to_string(),
                args,
                env,
            },
        },
        context: ContextRef {
            cluster: name.clone(),
            user: name.clone(),
        },
        cluster: ClusterEndpoint {
            server: connection.endpoint.clone(),
            certificate_authority_data: connection.certificate_authority_data.clone(),
        },
        name,
    }
}

impl<P: CloudProvider> Discovery<P> {
    /// Build the deduplicated kubeconfig for every discovered cluster.
    ///
    /// Accounts are visited with direct profiles first, then role profiles,
    /// each in resolver order; the first triple for a cluster wins. In
    /// separate mode the configuration goes to `sink` and an empty one is
    /// returned.
    #[instrument(skip_all, fields(accounts = accounts.len()))]
    pub async fn assemble_config(
        &self,
        accounts: &[AccountResult],
        profiles: &[Profile],
        sink: &dyn ConfigSink,
    ) -> Result<FinalConfiguration> {
        let mut ordered = Vec::with_capacity(accounts.len());
        for account in accounts {
            let (index, profile) = profiles
                .iter()
                .enumerate()
                .find(|(_, p)| p.name == account.name)
                .ok_or_else(|| FleetError::UnknownProfile(account.name.clone()))?;
            ordered.push((profile.is_role(), index, account, profile));
        }
        ordered.sort_by_key(|(is_role, index, _, _)| (*is_role, *index));

        let mut config = FinalConfiguration::default();
        let mut seen_identities = HashSet::new();
        let mut seen_names = HashSet::new();

        for (_, _, account, profile) in ordered {
            for triple in self.account_triples(account, profile).await? {
                if seen_identities.contains(&triple.identity) {
                    debug!(
                        "Cluster {} already reachable, skipping entry from profile {}",
                        triple.identity, profile.name
                    );
                    continue;
                }
                if seen_names.contains(&triple.name) {
                    warn!(
                        "Entry name {} for cluster {} is already used, skipping",
                        triple.name, triple.identity
                    );
                    continue;
                }
                seen_identities.insert(triple.identity.clone());
                seen_names.insert(triple.name.clone());
                config.push(triple);
            }
        }

        info!("Generated kubeconfig entries for {} clusters", config.len());

        if self.config.separate {
            sink.persist(&config)?;
            return Ok(FinalConfiguration::default());
        }
        Ok(config)
    }

    /// Triples for one account in the order its clusters were discovered
    #[instrument(skip_all, fields(profile = %profile.name))]
    async fn account_triples(
        &self,
        account: &AccountResult,
        profile: &Profile,
    ) -> Result<Vec<ConfigTriple>> {
        if account.clusters.is_empty() {
            return Ok(Vec::new());
        }

        let credentials = match self.credentials_for(profile).await {
            Ok(credentials) => credentials,
            Err(e) => {
                self.ensure_active()?;
                error!("Failed to get credentials for profile {}: {}", profile.name, e);
                return Err(e);
            }
        };

        let (tx, mut rx) = mpsc::channel(account.clusters.len());
        for (index, record) in account.clusters.iter().enumerate() {
            let tx = tx.clone();
            let discovery = self.clone();
            let credentials = credentials.clone();
            let region = record.region.clone();
            let name = record.name.clone();

            tokio::spawn(async move {
                let connection = discovery
                    .call(
                        "DescribeCluster",
                        discovery
                            .provider
                            .describe_cluster_connection(&credentials, &region, &name),
                    )
                    .await;
                let _ = tx.send((index, connection)).await;
            });
        }
        drop(tx);

        let mut connections = Vec::with_capacity(account.clusters.len());
        for _ in 0..account.clusters.len() {
            let Some((index, connection)) = rx.recv().await else {
                self.ensure_active()?;
                return Err(FleetError::provider(
                    "DescribeCluster",
                    format!("a lookup for profile {} did not report back", profile.name),
                ));
            };

            let record = &account.clusters[index];
            match connection {
                Ok(connection) => connections.push((index, connection)),
                Err(e) => {
                    self.ensure_active()?;
                    error!(
                        "Failed to describe cluster {} in {} with profile {}: {}",
                        record.name, record.region, profile.name, e
                    );
                    return Err(e);
                }
            }
        }
        connections.sort_by_key(|(index, _)| *index);

        Ok(connections
            .into_iter()
            .map(|(index, connection)| {
                build_triple(
                    &self.config,
                    profile,
                    &account.clusters[index].region,
                    &connection,
                )
            })
            .collect())
    }
}
