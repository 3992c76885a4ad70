// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Profile '{profile}' failed credential validation: {message}")]
    ProfileValidation { profile: String, message: String },

    #[error("No usable AWS profiles found")]
    NoProfiles,

    #[error("Failed to build supported version catalog with profile '{profile}': {message}")]
    MissingCatalog { profile: String, message: String },

    #[error("No default AWS region configured")]
    MissingRegion,

    #[error("Profile '{0}' is not part of the resolved profile list")]
    UnknownProfile(String),

    #[error("{operation} failed: {message}")]
    Provider { operation: String, message: String },

    #[error("Discovery did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("{0} was cancelled")]
    Cancelled(String),

    #[error("Failed to read identity store: {0}")]
    IdentityStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FleetError {
    pub fn provider(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        FleetError::Provider {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
