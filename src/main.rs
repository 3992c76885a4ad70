// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eksfleet::config::{Cli, Command};
use eksfleet::discovery::{Discovery, IdentityStore};
use eksfleet::kubeconfig::KubeconfigFileSink;
use eksfleet::provider::AwsCliProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout carries the command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let store_paths: Vec<_> = [config.aws_config_path(), config.aws_credentials_path()]
        .into_iter()
        .flatten()
        .collect();
    let store = IdentityStore::load(&store_paths)?;
    info!("Loaded {} sections from the AWS identity store", store.sections().len());

    let output = config.output.clone();
    let discovery = Discovery::new(AwsCliProvider::new(), config);
    let _deadline = discovery.arm_deadline();

    let cancel = discovery.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling discovery");
            cancel.cancel();
        }
    });

    match cli.command {
        Command::List => {
            let run = discovery.discover(&store).await?;
            let json = serde_json::to_string_pretty(&run.inventory)?;
            emit(output.as_deref(), &json)?;
        }
        Command::Find { name } => {
            let found = discovery.find_cluster(&store, &name).await?;
            if found.is_empty() {
                warn!("No cluster named {} found", name);
            }
            let json = serde_json::to_string_pretty(&found)?;
            emit(output.as_deref(), &json)?;
        }
        Command::Connect => {
            let path = discovery
                .config()
                .kubeconfig_path()
                .context("Unable to determine the kubeconfig location")?;
            let sink = KubeconfigFileSink::new(path);
            if discovery.config().separate {
                info!("Entries will be merged into {}", sink.path().display());
            }

            let run = discovery.discover(&store).await?;
            let kubeconfig = discovery
                .assemble_config(&run.inventory.accounts, &run.profiles, &sink)
                .await?;

            if !discovery.config().separate {
                emit(output.as_deref(), &kubeconfig.to_yaml()?)?;
            }
        }
    }

    Ok(())
}

fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
