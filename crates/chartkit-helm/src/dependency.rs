//! Repository reconciliation for chart dependencies
//!
//! Before a chart's dependencies can be built, every repository its
//! `Chart.yaml` points at must be known to Helm. The resolver registers the
//! missing ones under collision-free `auto-` names and refreshes the
//! repository indexes at most once per session.

use chartkit_core::{ChartManifest, CoreError};
use std::path::Path;

use crate::catalog::{Repository, RepositoryCatalog};
use crate::config::NetworkPolicy;
use crate::error::Result;
use crate::helm::HelmCli;
use crate::runner::CommandRunner;

/// What a reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Network disabled; nothing was checked
    Offline,
    /// No readable `Chart.yaml` in the directory
    NoManifest,
    /// The chart declares no remote repositories
    NoDependencies,
    /// Every referenced repository was already known
    UpToDate,
    /// Repositories were registered
    Added {
        repositories: Vec<Repository>,
        /// Whether this call ran the session's index refresh
        refreshed: bool,
    },
}

/// Whether `helm repo add` applies to a dependency reference
///
/// Local (`file://`), alias (`@name`, `alias:name`) and OCI references are
/// resolved by `helm dependency build` directly.
pub fn is_remote_repository(reference: &str) -> bool {
    reference.starts_with("https://") || reference.starts_with("http://")
}

/// Registers missing chart repositories
#[derive(Debug, Default)]
pub struct DependencyResolver {
    network: NetworkPolicy,
    catalog: RepositoryCatalog,
    index_refreshed: bool,
}

impl DependencyResolver {
    pub fn new(network: NetworkPolicy) -> Self {
        Self {
            network,
            catalog: RepositoryCatalog::new(),
            index_refreshed: false,
        }
    }

    pub fn network(&self) -> NetworkPolicy {
        self.network
    }

    pub fn catalog(&self) -> &RepositoryCatalog {
        &self.catalog
    }

    /// Whether `helm repo update` already ran this session
    pub fn index_refreshed(&self) -> bool {
        self.index_refreshed
    }

    /// Make sure every repository `chart_dir` depends on is registered
    ///
    /// Stops at the first failed `helm repo add`; repositories added before
    /// the failure stay registered.
    pub fn reconcile<R: CommandRunner>(
        &mut self,
        helm: &HelmCli<R>,
        chart_dir: &Path,
    ) -> Result<Reconciliation> {
        if !self.network.allows_network() {
            tracing::info!(
                "Skipping repo setup for {} (network disabled)",
                chart_dir.display()
            );
            return Ok(Reconciliation::Offline);
        }

        let manifest = match ChartManifest::load(chart_dir) {
            Ok(manifest) => manifest,
            Err(CoreError::ChartNotFound { path }) => {
                tracing::debug!("No Chart.yaml at {}; skipping", path);
                return Ok(Reconciliation::NoManifest);
            }
            Err(e) => {
                tracing::warn!("Bad Chart.yaml in {}: {}", chart_dir.display(), e);
                return Ok(Reconciliation::NoManifest);
            }
        };

        let urls: Vec<String> = manifest
            .dependency_repositories()
            .into_iter()
            .filter(|url| {
                let remote = is_remote_repository(url);
                if !remote {
                    tracing::debug!("Dependency repository {} needs no registration", url);
                }
                remote
            })
            .collect();
        if urls.is_empty() {
            tracing::debug!("Chart {} has no dependencies", chart_dir.display());
            return Ok(Reconciliation::NoDependencies);
        }

        self.catalog.load(helm);

        let mut to_add: Vec<Repository> = Vec::new();
        for url in urls {
            if let Some(name) = self.catalog.resolve_name(&url) {
                tracing::debug!("Repo exists already: {} ({})", url, name);
                continue;
            }
            let name = self
                .catalog
                .unique_name(&url, to_add.iter().map(|r| r.name.as_str()));
            to_add.push(Repository::new(name, url));
        }

        if to_add.is_empty() {
            tracing::debug!("All repos present for chart {}", chart_dir.display());
            return Ok(Reconciliation::UpToDate);
        }

        for repo in &to_add {
            tracing::info!("Adding repo '{}' for URL {} (auto-added)", repo.name, repo.url);
            if let Err(e) = helm.repo_add(&repo.name, &repo.url) {
                tracing::error!("Failed repo add {} ({}): {}", repo.name, repo.url, e);
                return Err(e);
            }
            self.catalog.register(&repo.url, &repo.name);
        }

        let mut refreshed = false;
        if !self.index_refreshed {
            tracing::info!("Running `helm repo update`");
            helm.repo_update()?;
            self.index_refreshed = true;
            refreshed = true;
        }

        Ok(Reconciliation::Added {
            repositories: to_add,
            refreshed,
        })
    }
}
