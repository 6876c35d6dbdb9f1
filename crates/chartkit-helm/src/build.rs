//! Once-per-session dependency builds
//!
//! `helm dependency build` is slow and touches the network, so each chart
//! directory is built at most once for the lifetime of a [`BuildCache`].
//! Entries are keyed by canonical path and only added after a successful
//! build, so a failed chart is retried on the next call.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::NetworkPolicy;
use crate::dependency::{DependencyResolver, Reconciliation};
use crate::error::Result;
use crate::helm::HelmCli;
use crate::runner::CommandRunner;

/// What [`BuildCache::ensure_built`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Network disabled; pre-built dependencies assumed
    Offline,
    /// Already built this session
    Cached,
    /// Dependencies were built now
    Built { reconciliation: Reconciliation },
}

/// Canonical form of a chart path, used as the cache key
///
/// Falls back to the absolute (non-resolved) form when the directory does
/// not exist, and to the raw path when even that fails.
pub fn canonical_chart_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Tracks charts whose dependencies are built
#[derive(Debug, Default)]
pub struct BuildCache {
    network: NetworkPolicy,
    built: HashSet<PathBuf>,
    resolver: DependencyResolver,
}

impl BuildCache {
    pub fn new(network: NetworkPolicy) -> Self {
        Self {
            network,
            built: HashSet::new(),
            resolver: DependencyResolver::new(network),
        }
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Whether `chart_dir` was built this session
    pub fn is_built(&self, chart_dir: &Path) -> bool {
        self.built.contains(&canonical_chart_path(chart_dir))
    }

    /// Built chart directories, canonical and sorted
    pub fn built_charts(&self) -> Vec<PathBuf> {
        let mut charts: Vec<PathBuf> = self.built.iter().cloned().collect();
        charts.sort();
        charts
    }

    /// Build `chart_dir`'s dependencies unless already done this session
    pub fn ensure_built<R: CommandRunner>(
        &mut self,
        helm: &HelmCli<R>,
        chart_dir: &Path,
    ) -> Result<BuildOutcome> {
        let chart = canonical_chart_path(chart_dir);

        if !self.network.allows_network() {
            tracing::info!(
                "Skipping dependency build for {} (network disabled)",
                chart.display()
            );
            return Ok(BuildOutcome::Offline);
        }

        if self.built.contains(&chart) {
            tracing::debug!("Dependencies already built for {}", chart.display());
            return Ok(BuildOutcome::Cached);
        }

        let reconciliation = self.resolver.reconcile(helm, &chart)?;

        tracing::info!("Building dependencies for {}", chart.display());
        helm.dependency_build(&chart)?;
        self.built.insert(chart);

        Ok(BuildOutcome::Built { reconciliation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;
    use std::fs;
    use tempfile::TempDir;

    fn chart(root: &Path, name: &str, repo: Option<&str>) -> PathBuf {
        let dir = root.join("charts").join(name);
        fs::create_dir_all(&dir).unwrap();
        let mut yaml = format!("apiVersion: v2\nname: {name}\nversion: 0.1.0\n");
        if let Some(url) = repo {
            yaml.push_str(&format!(
                "dependencies:\n  - name: common\n    version: 2.x.x\n    repository: {url}\n"
            ));
        }
        fs::write(dir.join("Chart.yaml"), yaml).unwrap();
        dir
    }

    fn setup() -> (MockRunner, HelmCli<MockRunner>) {
        let runner = MockRunner::new();
        (runner.clone(), HelmCli::new("helm", runner))
    }

    #[test]
    fn test_second_call_is_a_cache_hit() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "app", None);
        let (runner, helm) = setup();
        let mut cache = BuildCache::new(NetworkPolicy::Allowed);

        assert!(matches!(
            cache.ensure_built(&helm, &dir).unwrap(),
            BuildOutcome::Built { .. }
        ));
        let spawned = runner.invocations().len();

        assert_eq!(cache.ensure_built(&helm, &dir).unwrap(), BuildOutcome::Cached);
        assert_eq!(runner.invocations().len(), spawned);
        assert_eq!(runner.count(&["dependency", "build"]), 1);
    }

    #[test]
    fn test_relative_and_absolute_forms_share_an_entry() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "foo", None);
        let (runner, helm) = setup();
        let mut cache = BuildCache::new(NetworkPolicy::Allowed);

        let roundabout = tmp.path().join("charts").join("..").join("charts").join("foo");
        cache.ensure_built(&helm, &roundabout).unwrap();
        assert_eq!(cache.ensure_built(&helm, &dir).unwrap(), BuildOutcome::Cached);

        assert_eq!(runner.count(&["dependency", "build"]), 1);
        assert_eq!(cache.built_charts(), vec![fs::canonicalize(&dir).unwrap()]);
        assert!(cache.is_built(&roundabout));
    }

    #[test]
    fn test_offline_spawns_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "app", Some("https://charts.bitnami.com/bitnami"));
        let (runner, helm) = setup();
        let mut cache = BuildCache::new(NetworkPolicy::Disabled);

        assert_eq!(cache.ensure_built(&helm, &dir).unwrap(), BuildOutcome::Offline);
        assert_eq!(cache.ensure_built(&helm, &dir).unwrap(), BuildOutcome::Offline);
        assert!(runner.invocations().is_empty());
        assert!(!cache.is_built(&dir));
    }

    #[test]
    fn test_reconciles_before_building() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "app", Some("https://charts.bitnami.com/bitnami"));
        let (runner, helm) = setup();
        let mut cache = BuildCache::new(NetworkPolicy::Allowed);

        cache.ensure_built(&helm, &dir).unwrap();

        let verbs: Vec<String> = runner
            .invocations()
            .iter()
            .map(|c| c.args[..2].join(" "))
            .collect();
        assert_eq!(
            verbs,
            vec!["repo list", "repo add", "repo update", "dependency build"]
        );
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "app", None);
        let (runner, helm) = setup();
        runner.respond_once(
            &["dependency", "build"],
            crate::runner::CommandOutput::failed(1, "Error: no cached repository for auto-x"),
        );
        let mut cache = BuildCache::new(NetworkPolicy::Allowed);

        let err = cache.ensure_built(&helm, &dir).unwrap_err();
        assert!(err.command_line().unwrap().starts_with("helm dependency build"));
        assert!(!cache.is_built(&dir));

        // retried, and succeeds this time
        assert!(matches!(
            cache.ensure_built(&helm, &dir).unwrap(),
            BuildOutcome::Built { .. }
        ));
        assert_eq!(runner.count(&["dependency", "build"]), 2);
    }

    #[test]
    fn test_failed_reconciliation_skips_build() {
        let tmp = TempDir::new().unwrap();
        let dir = chart(tmp.path(), "app", Some("https://charts.bitnami.com/bitnami"));
        let (runner, helm) = setup();
        runner.fail(&["repo", "add"], "Error: 404 Not Found");
        let mut cache = BuildCache::new(NetworkPolicy::Allowed);

        let err = cache.ensure_built(&helm, &dir).unwrap_err();
        assert_eq!(err.stderr(), Some("Error: 404 Not Found"));
        assert_eq!(runner.count(&["dependency", "build"]), 0);
        assert!(cache.built_charts().is_empty());
    }

    #[test]
    fn test_canonical_path_of_missing_dir_is_absolute() {
        let path = canonical_chart_path(Path::new("does/not/exist"));
        assert!(path.is_absolute());
        assert!(path.ends_with("does/not/exist"));
    }
}
