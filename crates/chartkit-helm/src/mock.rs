//! Scripted command runner for testing
//!
//! Answers invocations from canned responses matched by argument prefix and
//! records every call, so tests can assert on exactly which subprocesses a
//! harness operation would have spawned.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::runner::{CommandOutput, CommandRunner};

/// A recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// Whether the arguments start with `prefix`
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

#[derive(Debug)]
struct Rule {
    prefix: Vec<String>,
    output: CommandOutput,
    /// Remaining uses; `None` means unlimited
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    calls: Vec<Invocation>,
}

/// In-memory runner; clones share state
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    /// Runner that succeeds with empty output for everything except
    /// `repo list`, which reports no repositories
    pub fn new() -> Self {
        let runner = Self::default();
        runner.respond(&["repo", "list"], CommandOutput::ok("[]"));
        runner
    }

    /// Answer calls starting with `prefix` with `output`
    ///
    /// Rules added later take precedence over earlier ones.
    pub fn respond(&self, prefix: &[&str], output: CommandOutput) -> &Self {
        self.push_rule(prefix, output, None);
        self
    }

    /// Answer only the next matching call with `output`
    pub fn respond_once(&self, prefix: &[&str], output: CommandOutput) -> &Self {
        self.push_rule(prefix, output, Some(1));
        self
    }

    /// Make calls starting with `prefix` fail with `stderr`
    pub fn fail(&self, prefix: &[&str], stderr: &str) -> &Self {
        self.respond(prefix, CommandOutput::failed(1, stderr))
    }

    /// Known repositories reported by `repo list`, as `(name, url)` pairs
    pub fn with_repositories(&self, repos: &[(&str, &str)]) -> &Self {
        let entries: Vec<serde_json::Value> = repos
            .iter()
            .map(|(name, url)| serde_json::json!({ "name": name, "url": url }))
            .collect();
        let json = serde_json::Value::Array(entries).to_string();
        self.respond(&["repo", "list"], CommandOutput::ok(json))
    }

    /// All recorded invocations, oldest first
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().calls.clone()
    }

    /// Recorded invocations whose arguments start with `prefix`
    pub fn calls(&self, prefix: &[&str]) -> Vec<Invocation> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of recorded invocations whose arguments start with `prefix`
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls(prefix).len()
    }

    /// Forget recorded invocations (rules are kept)
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn push_rule(&self, prefix: &[&str], output: CommandOutput, remaining: Option<usize>) {
        self.lock().rules.push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            output,
            remaining,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test poisons the lock; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let mut state = self.lock();
        let invocation = Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
        };

        let output = state
            .rules
            .iter_mut()
            .rev()
            .filter(|rule| rule.remaining != Some(0))
            .find(|rule| {
                let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
                invocation.starts_with(&prefix)
            })
            .map(|rule| {
                if let Some(n) = rule.remaining.as_mut() {
                    *n -= 1;
                }
                rule.output.clone()
            })
            .unwrap_or_default();

        state.calls.push(invocation);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(runner: &MockRunner, args: &[&str]) -> CommandOutput {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        runner.run(Path::new("helm"), &args).unwrap()
    }

    #[test]
    fn test_default_responses() {
        let runner = MockRunner::new();
        assert_eq!(run(&runner, &["repo", "list", "--output", "json"]).stdout, "[]");
        assert!(run(&runner, &["template", "x", "y"]).success());
        assert_eq!(runner.invocations().len(), 2);
    }

    #[test]
    fn test_latest_rule_wins_and_once_expires() {
        let runner = MockRunner::new();
        runner.fail(&["dependency", "build"], "boom");
        runner.respond_once(&["dependency", "build"], CommandOutput::ok("first"));

        assert_eq!(run(&runner, &["dependency", "build", "a"]).stdout, "first");
        let second = run(&runner, &["dependency", "build", "a"]);
        assert_eq!(second.exit_code, 1);
        assert_eq!(second.stderr, "boom");
        assert_eq!(runner.count(&["dependency", "build"]), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let runner = MockRunner::new();
        let handle = runner.clone();
        run(&runner, &["repo", "update"]);
        assert_eq!(handle.count(&["repo", "update"]), 1);

        handle.reset_calls();
        assert!(runner.invocations().is_empty());
    }

    #[test]
    fn test_with_repositories() {
        let runner = MockRunner::new();
        runner.with_repositories(&[("bitnami", "https://charts.bitnami.com/bitnami")]);
        let out = run(&runner, &["repo", "list", "--output", "json"]);
        let parsed: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
        assert_eq!(parsed[0]["name"], "bitnami");
    }
}
