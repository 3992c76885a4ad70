// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Concurrent discovery of EKS clusters across profiles and regions.

pub mod aggregator;
pub mod catalog;
pub mod clusters;
pub mod profiles;
pub mod regions;

pub use aggregator::DiscoveryRun;
pub use profiles::IdentityStore;

use crate::config::Config;
use crate::error::{FleetError, Result};
use crate::provider::{CloudProvider, Credentials};
use crate::types::profile::{Profile, ProfileKind};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shared state handed to every discovery task.
///
/// Cloning is cheap: all fields are reference counted. Provider calls go
/// through [`Discovery::call`], which bounds concurrency and observes the
/// run's cancellation token.
pub struct Discovery<P> {
    pub(crate) provider: Arc<P>,
    pub(crate) config: Arc<Config>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    deadline_hit: Arc<AtomicBool>,
}

impl<P> Clone for Discovery<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: Arc::clone(&self.config),
            permits: Arc::clone(&self.permits),
            cancel: self.cancel.clone(),
            deadline_hit: Arc::clone(&self.deadline_hit),
        }
    }
}

impl<P: CloudProvider> Discovery<P> {
    pub fn new(provider: P, config: Config) -> Self {
        let permits = config.max_concurrency.max(1);
        Self {
            provider: Arc::new(provider),
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(permits)),
            cancel: CancellationToken::new(),
            deadline_hit: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token cancelling every in-flight provider call of this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the run once the configured timeout has elapsed
    pub fn arm_deadline(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        let deadline_hit = Arc::clone(&self.deadline_hit);
        let timeout = self.config.timeout();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    warn!("Deadline of {:?} reached, cancelling discovery", timeout);
                    deadline_hit.store(true, Ordering::SeqCst);
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        })
    }

    /// Fail when the run was cancelled
    pub(crate) fn ensure_active(&self) -> Result<()> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        if self.deadline_hit.load(Ordering::SeqCst) {
            Err(FleetError::DeadlineExceeded(self.config.timeout()))
        } else {
            Err(FleetError::Cancelled("Discovery".to_string()))
        }
    }

    /// Run one provider call under a concurrency permit
    pub(crate) async fn call<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = tokio::select! {
            permit = self.permits.acquire() => {
                permit.map_err(|_| FleetError::Cancelled(operation.to_string()))?
            }
            _ = self.cancel.cancelled() => {
                return Err(FleetError::Cancelled(operation.to_string()));
            }
        };

        tokio::select! {
            result = call => result,
            _ = self.cancel.cancelled() => Err(FleetError::Cancelled(operation.to_string())),
        }
    }

    /// Credentials for a profile, assuming its role first when it has one
    pub async fn credentials_for(&self, profile: &Profile) -> Result<Credentials> {
        match &profile.kind {
            ProfileKind::Direct => Ok(Credentials::Profile(profile.name.clone())),
            ProfileKind::AssumeRole {
                role_arn,
                source_profile,
            } => {
                let region = self.config.default_region()?;
                let base = Credentials::Profile(
                    source_profile
                        .clone()
                        .unwrap_or_else(|| self.config.role_source_profile.clone()),
                );
                let credentials = self
                    .call(
                        "AssumeRole",
                        self.provider.assume_role(
                            &base,
                            region,
                            role_arn,
                            &self.config.role_session_name,
                        ),
                    )
                    .await?;
                debug!("Assumed role {} for profile {}", role_arn, profile.name);
                Ok(credentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeProvider;
    use std::time::Duration;

    #[tokio::test]
    async fn test_direct_profile_uses_named_credentials() {
        let discovery = Discovery::new(FakeProvider::new(), Config::default());

        let creds = discovery
            .credentials_for(&Profile::direct("dev", "profile dev"))
            .await
            .unwrap();

        assert_eq!(creds, Credentials::Profile("dev".to_string()));
    }

    #[tokio::test]
    async fn test_role_profile_assumes_role() {
        let arn = "arn:aws:iam::111111111111:role/ops";
        let discovery = Discovery::new(FakeProvider::new(), Config::default());

        let creds = discovery
            .credentials_for(&Profile::assume_role("ops", "profile ops", arn, None))
            .await
            .unwrap();

        assert_eq!(FakeProvider::identity_of(&creds), FakeProvider::role_identity(arn));
    }

    #[tokio::test]
    async fn test_failed_role_assumption_is_an_error() {
        let arn = "arn:aws:iam::111111111111:role/ops";
        let provider = FakeProvider::new().failing_assume_role(arn);
        let discovery = Discovery::new(provider, Config::default());

        let result = discovery
            .credentials_for(&Profile::assume_role("ops", "profile ops", arn, None))
            .await;

        assert!(matches!(result, Err(FleetError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_call_is_cancelled_by_token() {
        let discovery = Discovery::new(FakeProvider::new(), Config::default());
        discovery.cancellation_token().cancel();

        let result: Result<()> = discovery
            .call("Stuck", futures::future::pending::<Result<()>>())
            .await;

        assert!(matches!(result, Err(FleetError::Cancelled(_))));
        assert!(matches!(discovery.ensure_active(), Err(FleetError::Cancelled(_))));
    }

    #[tokio::test]
    async fn test_deadline_reports_timeout() {
        let config = Config {
            timeout_secs: 0,
            ..Default::default()
        };
        let discovery = Discovery::new(FakeProvider::new(), config);

        discovery.arm_deadline().await.unwrap();

        let result: Result<()> = discovery
            .call("Stuck", futures::future::pending::<Result<()>>())
            .await;
        assert!(matches!(result, Err(FleetError::Cancelled(_))));
        assert!(matches!(
            discovery.ensure_active(),
            Err(FleetError::DeadlineExceeded(d)) if d == Duration::from_secs(0)
        ));
    }
}
