// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{FleetError, Result};
use crate::types::kubeconfig::FinalConfiguration;
use kube::config::Kubeconfig;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Destination for a finished configuration
pub trait ConfigSink: Send + Sync {
    fn persist(&self, config: &FinalConfiguration) -> Result<()>;
}

/// Merges generated entries into a kubeconfig file on disk.
///
/// Generated entries replace existing entries with the same name; everything
/// else in the file is kept. The file is replaced atomically, keeps its
/// permissions, and a symlinked kubeconfig is written through the link.
/// New files are created readable by the owner only.
#[derive(Debug, Clone)]
pub struct KubeconfigFileSink {
    path: PathBuf,
}

impl KubeconfigFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file actually written: the link target when the path is a symlink
    fn target(&self) -> PathBuf {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone())
            }
            _ => self.path.clone(),
        }
    }
}

impl ConfigSink for KubeconfigFileSink {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn persist(&self, config: &FinalConfiguration) -> Result<()> {
        let target = self.target();
        let generated = config.to_kubeconfig()?;

        let merged = if target.exists() {
            debug!("Merging into existing kubeconfig {}", target.display());
            generated.merge(Kubeconfig::read_from(&target)?)?
        } else {
            generated
        };

        let yaml = serde_yaml::to_string(&merged)
            .map_err(|e| FleetError::Serialization(format!("Failed to render kubeconfig: {}", e)))?;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = target.with_extension("eksfleet.tmp");
        if let Err(e) = replace_file(&staging, &target, yaml.as_bytes()) {
            if let Err(cleanup) = fs::remove_file(&staging) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", staging.display(), cleanup);
                }
            }
            return Err(e.into());
        }

        info!(
            "Wrote {} cluster entries to {}",
            config.len(),
            target.display()
        );
        Ok(())
    }
}

/// Write `contents` next to `target` and rename it into place, carrying over
/// the permissions of an existing target
fn replace_file(staging: &Path, target: &Path, contents: &[u8]) -> io::Result<()> {
    let permissions = match fs::metadata(target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    // A leftover staging file would keep its own mode
    match fs::remove_file(staging) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(staging)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Some(permissions) = permissions {
        fs::set_permissions(staging, permissions)?;
    }
    fs::rename(staging, target)
}
