//! Typed wrapper over the Helm CLI verbs the harness uses

use std::path::{Path, PathBuf};

use crate::error::{HelmError, Result};
use crate::runner::{CommandOutput, CommandRunner};

/// Binary name looked up on `PATH` when no override is given
pub const DEFAULT_BINARY: &str = "helm";

/// Locate the Helm binary
///
/// An override may be a path or a bare program name; either way it must
/// resolve to an executable or this fails immediately.
pub fn locate_binary(binary_override: Option<&Path>) -> Result<PathBuf> {
    let candidate = binary_override.unwrap_or_else(|| Path::new(DEFAULT_BINARY));
    which::which(candidate).map_err(|e| HelmError::BinaryNotFound {
        message: format!("{}: {}", candidate.display(), e),
    })
}

/// The Helm CLI bound to a binary and a runner
#[derive(Debug, Clone)]
pub struct HelmCli<R> {
    binary: PathBuf,
    runner: R,
}

impl<R: CommandRunner> HelmCli<R> {
    pub fn new(binary: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Full command line for `args`, binary first
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        std::iter::once(self.binary.display().to_string())
            .chain(args.iter().cloned())
            .collect()
    }

    /// Run a verb and return its output whatever the exit code
    pub fn run(&self, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(command = %self.command_line(args).join(" "), "running helm");
        let output = self.runner.run(&self.binary, args)?;

        let verb = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        if !output.stdout.trim().is_empty() {
            tracing::debug!("`helm {}` stdout:\n{}", verb, output.stdout.trim_end());
        }
        if !output.stderr.trim().is_empty() {
            tracing::debug!("`helm {}` stderr:\n{}", verb, output.stderr.trim_end());
        }
        Ok(output)
    }

    /// Run a verb; a non-zero exit becomes [`HelmError::ToolInvocation`]
    pub fn run_checked(&self, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(HelmError::invocation(self.command_line(args), &output.stderr))
        }
    }

    /// `helm repo list --output json` (exit code left to the caller)
    pub fn repo_list(&self) -> Result<CommandOutput> {
        self.run(&strings(&["repo", "list", "--output", "json"]))
    }

    /// `helm repo add <name> <url>`
    pub fn repo_add(&self, name: &str, url: &str) -> Result<CommandOutput> {
        self.run_checked(&strings(&["repo", "add", name, url]))
    }

    /// `helm repo update`
    pub fn repo_update(&self) -> Result<CommandOutput> {
        self.run_checked(&strings(&["repo", "update"]))
    }

    /// `helm dependency build <chart>`
    pub fn dependency_build(&self, chart_dir: &Path) -> Result<CommandOutput> {
        let chart = chart_dir.display().to_string();
        self.run_checked(&strings(&["dependency", "build", &chart]))
    }

    /// `helm template ...` with pre-built arguments (verb excluded)
    pub fn template(&self, args: &[String]) -> Result<CommandOutput> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("template".to_string());
        full.extend(args.iter().cloned());
        self.run_checked(&full)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;

    #[test]
    fn test_verbs_build_expected_arguments() {
        let runner = MockRunner::new();
        let helm = HelmCli::new("/usr/bin/helm", runner.clone());

        helm.repo_list().unwrap();
        helm.repo_add("auto-bitnami", "https://charts.bitnami.com/bitnami").unwrap();
        helm.repo_update().unwrap();
        helm.dependency_build(Path::new("/charts/app")).unwrap();

        let lines: Vec<String> = runner
            .invocations()
            .iter()
            .map(|c| c.args.join(" "))
            .collect();
        assert_eq!(
            lines,
            vec![
                "repo list --output json",
                "repo add auto-bitnami https://charts.bitnami.com/bitnami",
                "repo update",
                "dependency build /charts/app",
            ]
        );
        assert!(
            runner
                .invocations()
                .iter()
                .all(|c| c.program == Path::new("/usr/bin/helm"))
        );
    }

    #[test]
    fn test_run_checked_maps_failure() {
        let runner = MockRunner::new();
        runner.fail(&["repo", "update"], "Error: no repositories found\n");
        let helm = HelmCli::new("helm", runner);

        let err = helm.repo_update().unwrap_err();
        assert_eq!(err.command_line().as_deref(), Some("helm repo update"));
        assert_eq!(err.stderr(), Some("Error: no repositories found"));
    }

    #[test]
    fn test_repo_list_failure_is_not_an_error() {
        let runner = MockRunner::new();
        runner.fail(&["repo", "list"], "Error: no repositories to show");
        let helm = HelmCli::new("helm", runner);

        let out = helm.repo_list().unwrap();
        assert!(!out.success());
    }

    #[test]
    fn test_locate_missing_override() {
        let err = locate_binary(Some(Path::new("/no/such/dir/helm"))).unwrap_err();
        assert!(matches!(err, HelmError::BinaryNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_explicit_executable() {
        let found = locate_binary(Some(Path::new("/bin/sh"))).unwrap();
        assert!(found.ends_with("sh"));
    }
}
