//! Minimal git access for repository checks

use chartkit_helm::{CommandOutput, CommandRunner};
use std::path::{Component, Path, PathBuf};

use crate::error::{CliError, Result};

/// git bound to a work tree
#[derive(Debug, Clone)]
pub struct Git<R> {
    binary: PathBuf,
    work_tree: PathBuf,
    runner: R,
}

impl<R: CommandRunner> Git<R> {
    pub fn new(work_tree: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            binary: PathBuf::from("git"),
            work_tree: work_tree.into(),
            runner,
        }
    }

    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let mut full = vec!["-C".to_string(), self.work_tree.display().to_string()];
        full.extend(args.iter().cloned());
        tracing::debug!(command = %full.join(" "), "running git");
        Ok(self.runner.run(&self.binary, &full)?)
    }

    /// Files changed between `base` and `HEAD` under `paths`
    pub fn diff_names(&self, base: &str, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut args: Vec<String> = ["diff", "--name-only", base, "HEAD", "--"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(paths.iter().map(|p| to_git_path(p)));

        let output = self.run(&args)?;
        if !output.success() {
            return Err(CliError::command(format!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Content of `path` at `rev`; `None` when it does not exist there
    pub fn show(&self, rev: &str, path: &Path) -> Result<Option<String>> {
        let object = format!("{}:{}", rev, to_git_path(path));
        let output = self.run(&["show".to_string(), object])?;
        Ok(output.success().then_some(output.stdout))
    }
}

/// Repository-relative path with `/` separators and no `.` components
pub fn to_git_path(path: &Path) -> String {
    normalize_relative(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Drop `.` components so prefixes compare component-wise
pub fn normalize_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
