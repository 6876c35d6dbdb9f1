//! Known chart repositories for the current session
//!
//! Loaded once from `helm repo list`, then grown in memory as the resolver
//! registers repositories. Entries are never removed during a session.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::helm::HelmCli;
use crate::runner::CommandRunner;

/// Prefix marking repositories the harness registered itself
pub const AUTO_PREFIX: &str = "auto-";

/// Base token used when nothing usable can be derived from a URL
const FALLBACK_BASE: &str = "repo";

/// A named chart repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One entry of `helm repo list --output json`; extra fields are ignored
#[derive(Debug, Deserialize)]
struct RepoListEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Parse `helm repo list --output json`
///
/// Returns `None` when the output is not a JSON array. Entries missing a
/// name or URL are skipped; blank output means no repositories.
pub fn parse_repo_list(stdout: &str) -> Option<Vec<Repository>> {
    if stdout.trim().is_empty() {
        return Some(Vec::new());
    }

    let entries: Vec<serde_json::Value> = serde_json::from_str(stdout).ok()?;
    Some(
        entries
            .into_iter()
            .filter_map(|v| serde_json::from_value::<RepoListEntry>(v).ok())
            .filter_map(|e| match (e.name, e.url) {
                (Some(name), Some(url)) if !name.is_empty() && !url.is_empty() => {
                    Some(Repository { name, url })
                }
                _ => None,
            })
            .collect(),
    )
}

/// Session catalog of repositories, keyed by URL
#[derive(Debug, Default)]
pub struct RepositoryCatalog {
    by_url: HashMap<String, String>,
    names: HashSet<String>,
    loaded: bool,
}

impl RepositoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Populate from `helm repo list`, once per session
    ///
    /// Any failure (spawn error, non-zero exit, unparsable output) is logged
    /// and leaves the catalog loaded but empty: unknown repositories are then
    /// simply registered again.
    pub fn load<R: CommandRunner>(&mut self, helm: &HelmCli<R>) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        tracing::debug!("Loading Helm repos with `helm repo list`");
        let output = match helm.repo_list() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to list repos: {}", e);
                return;
            }
        };

        if !output.success() {
            tracing::warn!(
                "Failed to list repos (exit={}): {}",
                output.exit_code,
                output.stderr.trim()
            );
            return;
        }

        let Some(repos) = parse_repo_list(&output.stdout) else {
            tracing::warn!(
                "Unable to parse helm repo list JSON; stdout:\n{}",
                output.stdout
            );
            return;
        };

        for repo in repos {
            tracing::debug!("Repo found: {} -> {}", repo.name, repo.url);
            self.register(&repo.url, &repo.name);
        }
    }

    /// Name registered for `url`, if any
    pub fn resolve_name(&self, url: &str) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    /// Whether `name` is taken by any known repository
    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record a repository
    ///
    /// A URL keeps the first name it was registered under; every name is
    /// remembered for collision checks.
    pub fn register(&mut self, url: &str, name: &str) {
        self.names.insert(name.to_string());
        self.by_url
            .entry(url.to_string())
            .or_insert_with(|| name.to_string());
    }

    /// Candidate name for an auto-registered repository
    ///
    /// Last non-empty path segment (or the host when the path is empty),
    /// cut at the first `.`, prefixed with [`AUTO_PREFIX`].
    pub fn derive_name(url: &str) -> String {
        let base = Url::parse(url)
            .ok()
            .and_then(|parsed| {
                let host = parsed.host_str().filter(|h| !h.is_empty())?.to_string();
                let tail = parsed
                    .path_segments()
                    .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                    .map(str::to_string)
                    .unwrap_or(host);
                tail.split('.').next().map(str::to_string)
            })
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| FALLBACK_BASE.to_string());

        format!("{AUTO_PREFIX}{base}")
    }

    /// Collision-free name for `url`
    ///
    /// Checks against known names and `pending` ones; on collision appends
    /// `-2`, `-3`, ... until unique.
    pub fn unique_name<'a, I>(&self, url: &str, pending: I) -> String
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let base = Self::derive_name(url);
        let taken = |candidate: &str| {
            self.has_name(candidate) || pending.clone().into_iter().any(|p| p == candidate)
        };

        let mut name = base.clone();
        let mut n = 1;
        while taken(&name) {
            n += 1;
            name = format!("{base}-{n}");
        }
        name
    }

    /// All known repositories, sorted by name
    pub fn repositories(&self) -> Vec<Repository> {
        let mut repos: Vec<Repository> = self
            .by_url
            .iter()
            .map(|(url, name)| Repository::new(name, url))
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        repos
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;
    use crate::runner::CommandOutput;

    fn helm(runner: &MockRunner) -> HelmCli<MockRunner> {
        HelmCli::new("helm", runner.clone())
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(
            RepositoryCatalog::derive_name("https://charts.bitnami.com/bitnami"),
            "auto-bitnami"
        );
        assert_eq!(
            RepositoryCatalog::derive_name("https://example.com/a/repoX.git"),
            "auto-repoX"
        );
        assert_eq!(
            RepositoryCatalog::derive_name("https://aws.github.io/eks-charts/"),
            "auto-eks-charts"
        );
        assert_eq!(
            RepositoryCatalog::derive_name("https://charts.example.com"),
            "auto-charts"
        );
    }

    #[test]
    fn test_derive_name_degenerate_urls() {
        assert_eq!(RepositoryCatalog::derive_name("not a url"), "auto-repo");
        assert_eq!(RepositoryCatalog::derive_name("file:///srv/charts"), "auto-repo");
        assert_eq!(RepositoryCatalog::derive_name("https://example.com/.hidden"), "auto-repo");
        assert_eq!(RepositoryCatalog::derive_name(""), "auto-repo");
    }

    #[test]
    fn test_unique_name_against_known_and_pending() {
        let mut catalog = RepositoryCatalog::new();
        catalog.register("https://example.com/a/repoX.git", "auto-repoX");

        let pending = ["auto-repoX-2"];
        let name = catalog.unique_name("https://other.com/b/repoX.tgz", pending.iter().copied());
        assert_eq!(name, "auto-repoX-3");

        let name = catalog.unique_name("https://other.com/b/repoX.tgz", std::iter::empty());
        assert_eq!(name, "auto-repoX-2");
    }

    #[test]
    fn test_register_keeps_first_name_per_url() {
        let mut catalog = RepositoryCatalog::new();
        catalog.register("https://example.com/charts", "first");
        catalog.register("https://example.com/charts", "second");

        assert_eq!(catalog.resolve_name("https://example.com/charts"), Some("first"));
        assert!(catalog.has_name("second"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_parse_repo_list() {
        let repos = parse_repo_list(
            r#"[{"name":"bitnami","url":"https://charts.bitnami.com/bitnami"},
                {"name":"broken"},
                {"name":"","url":"https://x"},
                "garbage"]"#,
        )
        .unwrap();
        assert_eq!(
            repos,
            vec![Repository::new("bitnami", "https://charts.bitnami.com/bitnami")]
        );

        assert!(parse_repo_list("").unwrap().is_empty());
        assert!(parse_repo_list("{not json").is_none());
        assert!(parse_repo_list(r#"{"name":"x"}"#).is_none());
    }

    #[test]
    fn test_load_once() {
        let runner = MockRunner::new();
        runner.with_repositories(&[("bitnami", "https://charts.bitnami.com/bitnami")]);
        let helm = helm(&runner);
        let mut catalog = RepositoryCatalog::new();

        catalog.load(&helm);
        catalog.load(&helm);

        assert!(catalog.is_loaded());
        assert_eq!(
            catalog.resolve_name("https://charts.bitnami.com/bitnami"),
            Some("bitnami")
        );
        assert_eq!(runner.count(&["repo", "list"]), 1);
    }

    #[test]
    fn test_load_failure_degrades_to_empty() {
        let runner = MockRunner::new();
        runner.fail(&["repo", "list"], "Error: no repositories to show");
        let mut catalog = RepositoryCatalog::new();

        catalog.load(&helm(&runner));
        assert!(catalog.is_loaded());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_unparsable_degrades_to_empty() {
        let runner = MockRunner::new();
        runner.respond(&["repo", "list"], CommandOutput::ok("NAME\tURL\n"));
        let mut catalog = RepositoryCatalog::new();

        catalog.load(&helm(&runner));
        assert!(catalog.is_loaded());
        assert!(catalog.is_empty());

        catalog.load(&helm(&runner));
        assert_eq!(runner.count(&["repo", "list"]), 1);
    }
}
