//! `helm template` rendering with dependency preparation

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::build::{BuildCache, BuildOutcome};
use crate::config::NetworkPolicy;
use crate::error::Result;
use crate::helm::HelmCli;
use crate::runner::CommandRunner;

/// Everything needed for one `helm template` call
///
/// Values files and overrides are applied in order; later entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    pub release_name: String,
    pub chart_path: PathBuf,
    pub namespace: Option<String>,
    pub values_files: Vec<PathBuf>,
    /// `--set key=value` pairs, in insertion order
    pub value_overrides: IndexMap<String, String>,
    pub show_only: Vec<String>,
    /// Appended verbatim after everything else
    pub extra_args: Vec<String>,
}

impl RenderRequest {
    pub fn new(release_name: impl Into<String>, chart_path: impl Into<PathBuf>) -> Self {
        Self {
            release_name: release_name.into(),
            chart_path: chart_path.into(),
            ..Default::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn values_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_files.push(path.into());
        self
    }

    pub fn values_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.values_files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add an override; re-setting a key keeps its original position
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.value_overrides.insert(key.into(), value.into());
        self
    }

    pub fn show_only(mut self, target: impl Into<String>) -> Self {
        self.show_only.push(target.into());
        self
    }

    pub fn extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Arguments for `helm template`, verb excluded
    pub fn template_args(&self) -> Vec<String> {
        let mut args = vec![
            self.release_name.clone(),
            self.chart_path.display().to_string(),
        ];

        if let Some(ns) = &self.namespace {
            args.push("--namespace".to_string());
            args.push(ns.clone());
        }

        for file in &self.values_files {
            args.push("--values".to_string());
            args.push(file.display().to_string());
        }

        for (key, value) in &self.value_overrides {
            args.push("--set".to_string());
            args.push(format!("{key}={value}"));
        }

        for target in &self.show_only {
            args.push("--show-only".to_string());
            args.push(target.clone());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Renders charts, building their dependencies first
#[derive(Debug)]
pub struct ChartRenderer<R> {
    helm: HelmCli<R>,
    cache: BuildCache,
}

impl<R: CommandRunner> ChartRenderer<R> {
    pub fn new(helm: HelmCli<R>, network: NetworkPolicy) -> Self {
        Self {
            helm,
            cache: BuildCache::new(network),
        }
    }

    pub fn helm(&self) -> &HelmCli<R> {
        &self.helm
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Build dependencies for `chart_dir` unless already done
    pub fn ensure_built(&mut self, chart_dir: &Path) -> Result<BuildOutcome> {
        self.cache.ensure_built(&self.helm, chart_dir)
    }

    /// Render `request`; stdout is returned untouched
    ///
    /// Nothing is templated when the dependency build fails.
    pub fn render(&mut self, request: &RenderRequest) -> Result<String> {
        self.ensure_built(&request.chart_path)?;

        let output = self.helm.template(&request.template_args())?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HelmError;
    use crate::mock::MockRunner;
    use crate::runner::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    fn chart_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Chart.yaml"),
            "apiVersion: v2\nname: app\nversion: 0.1.0\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_template_args_order() {
        let request = RenderRequest::new("web", "charts/web")
            .namespace("prod")
            .values_file("tests/fixtures/web/minimal-values.yaml")
            .values_file("/tmp/extra.yaml")
            .set("image.tag", "1.2.3")
            .set("replicaCount", "2")
            .show_only("templates/deployment.yaml")
            .extra_arg("--kube-version")
            .extra_arg("1.29.0");

        insta::assert_snapshot!(
            request.template_args().join(" "),
            @"web charts/web --namespace prod --values tests/fixtures/web/minimal-values.yaml --values /tmp/extra.yaml --set image.tag=1.2.3 --set replicaCount=2 --show-only templates/deployment.yaml --kube-version 1.29.0"
        );
    }

    #[test]
    fn test_overrides_keep_insertion_order() {
        let request = RenderRequest::new("r", "c")
            .set("zeta", "1")
            .set("alpha", "2")
            .set("zeta", "3");
        assert_eq!(
            request.template_args(),
            vec!["r", "c", "--set", "zeta=3", "--set", "alpha=2"]
        );
    }

    #[test]
    fn test_render_returns_stdout_verbatim() {
        let chart = chart_dir();
        let runner = MockRunner::new();
        runner.respond(
            &["template"],
            CommandOutput::ok("---\n# Source: app/templates/cm.yaml\nkind: ConfigMap\n\n\n"),
        );
        let mut renderer =
            ChartRenderer::new(HelmCli::new("helm", runner.clone()), NetworkPolicy::Allowed);

        let text = renderer
            .render(&RenderRequest::new("app", chart.path()))
            .unwrap();
        assert_eq!(text, "---\n# Source: app/templates/cm.yaml\nkind: ConfigMap\n\n\n");

        renderer
            .render(&RenderRequest::new("app", chart.path()))
            .unwrap();
        assert_eq!(runner.count(&["dependency", "build"]), 1);
        assert_eq!(runner.count(&["template"]), 2);
    }

    #[test]
    fn test_schema_rejection_is_a_typed_failure() {
        let chart = chart_dir();
        let runner = MockRunner::new();
        runner.fail(
            &["template"],
            "Error: values don't meet the specifications of the schema(s) in the following chart(s):\napp:\n- ingress.enabled: Invalid type. Expected: boolean, given: string\n",
        );
        let mut renderer =
            ChartRenderer::new(HelmCli::new("helm", runner), NetworkPolicy::Allowed);

        let err = renderer
            .render(&RenderRequest::new("app", chart.path()).set("ingress.enabled", "maybe"))
            .unwrap_err();

        match err {
            HelmError::ToolInvocation { command, stderr } => {
                assert_eq!(command[1], "template");
                assert!(command.contains(&"ingress.enabled=maybe".to_string()));
                assert!(stderr.contains("Expected: boolean"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failed_build_prevents_templating() {
        let chart = chart_dir();
        let runner = MockRunner::new();
        runner.fail(&["dependency", "build"], "Error: chart directory missing");
        let mut renderer =
            ChartRenderer::new(HelmCli::new("helm", runner.clone()), NetworkPolicy::Allowed);

        assert!(
            renderer
                .render(&RenderRequest::new("app", chart.path()))
                .is_err()
        );
        assert_eq!(runner.count(&["template"]), 0);
    }

    #[test]
    fn test_offline_render_only_templates() {
        let chart = chart_dir();
        let runner = MockRunner::new();
        let mut renderer =
            ChartRenderer::new(HelmCli::new("helm", runner.clone()), NetworkPolicy::Disabled);

        renderer
            .render(&RenderRequest::new("app", chart.path()))
            .unwrap();
        let verbs: Vec<String> = runner.invocations().iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(verbs, vec!["template"]);
    }
}
