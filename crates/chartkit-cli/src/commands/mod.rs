//! CLI command implementations

pub mod fixtures;
pub mod goldens;
pub mod linter_symlinks;
pub mod prefetch;
pub mod release_workflow;
pub mod render;
pub mod version_bump;

use chartkit_core::RepoLayout;
use chartkit_helm::{Harness, HarnessConfig, NetworkPolicy};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Options shared by every command
#[derive(Debug)]
pub struct Context {
    pub layout: RepoLayout,
    pub harness_config: HarnessConfig,
}

impl Context {
    pub fn open(root: &Path, helm_bin: Option<PathBuf>, skip_network: bool) -> Result<Self> {
        let layout = RepoLayout::discover(root)?;
        let harness_config = HarnessConfig {
            helm_binary: helm_bin,
            network: NetworkPolicy::from(!skip_network),
        };
        tracing::debug!(root = %root.display(), network = ?harness_config.network, "context ready");

        Ok(Self {
            layout,
            harness_config,
        })
    }

    /// Start a rendering session; fails when Helm cannot be found
    pub fn harness(&self) -> Result<Harness> {
        Ok(Harness::new(self.harness_config.clone())?)
    }

    /// `path` relative to the repository root (absolute paths pass through)
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.layout.root().join(path)
    }

    /// `path` shown relative to the repository root when possible
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(self.layout.root())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Sorted regular `.yaml` files directly inside `dir`
pub fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    files.sort();
    Ok(files)
}

/// File name of `path` as a string
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
