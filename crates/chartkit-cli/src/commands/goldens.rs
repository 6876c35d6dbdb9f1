//! Golden manifests for values fixtures: regeneration and the regression check

use chartkit_core::golden::{GoldenComparison, compare, golden_path_for, normalize};
use chartkit_core::layout::subdirectories;
use chartkit_helm::{CommandRunner, Harness, RenderRequest};
use console::style;
use std::fs;
use std::path::PathBuf;

use super::{Context, file_name, yaml_files};
use crate::display::CheckReport;
use crate::error::{CliError, Result};

/// A values fixture and the chart it renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub chart_name: String,
    pub chart_dir: PathBuf,
    pub values_file: PathBuf,
}

/// Every `*-values.yaml` under a fixtures directory whose chart exists
pub fn fixtures(ctx: &Context) -> Result<Vec<Fixture>> {
    let mut found = Vec::new();

    for fixture_dir in subdirectories(&ctx.layout.fixtures_dir()) {
        let chart_name = file_name(&fixture_dir);
        let chart_dir = ctx.layout.chart(chart_name.as_str()).chart_dir();
        if !chart_dir.is_dir() {
            tracing::debug!("No chart for fixtures in {}", fixture_dir.display());
            continue;
        }

        for values_file in yaml_files(&fixture_dir)? {
            if file_name(&values_file).ends_with("-values.yaml") {
                found.push(Fixture {
                    chart_name: chart_name.clone(),
                    chart_dir: chart_dir.clone(),
                    values_file,
                });
            }
        }
    }

    Ok(found)
}

fn no_fixtures(ctx: &Context) -> CliError {
    CliError::chart(format!(
        "No fixture values files were found in {}",
        ctx.layout.fixtures_dir().display()
    ))
}

/// Fixtures render with the chart name as release name
fn render_request(fixture: &Fixture) -> RenderRequest {
    RenderRequest::new(&fixture.chart_name, &fixture.chart_dir).values_file(&fixture.values_file)
}

/// Whether a golden file was rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoldenUpdate {
    Updated,
    Unchanged,
}

/// Render one fixture and write its golden file if the content changed
pub fn regenerate<R: CommandRunner>(harness: &mut Harness<R>, fixture: &Fixture) -> Result<GoldenUpdate> {
    let rendered = normalize(&harness.render(&render_request(fixture))?);

    let golden = golden_path_for(&fixture.values_file);
    if golden.is_file() && fs::read_to_string(&golden)? == rendered {
        return Ok(GoldenUpdate::Unchanged);
    }

    fs::write(&golden, rendered)?;
    Ok(GoldenUpdate::Updated)
}

pub fn run(ctx: &Context) -> Result<()> {
    let fixtures = fixtures(ctx)?;
    if fixtures.is_empty() {
        return Err(no_fixtures(ctx));
    }

    let mut harness = ctx.harness()?;
    for fixture in &fixtures {
        let golden = ctx.display_path(&golden_path_for(&fixture.values_file));
        match regenerate(&mut harness, fixture)? {
            GoldenUpdate::Unchanged => {
                println!("{} Skipped {}: unchanged", style("-").dim(), golden)
            }
            GoldenUpdate::Updated => println!("{} Updated {}", style("✓").green(), golden),
        }
    }
    Ok(())
}

/// Render every fixture that has a golden file and compare the two
///
/// Fixtures without a golden are left to `check fixtures`.
pub fn check<R: CommandRunner>(
    ctx: &Context,
    harness: &mut Harness<R>,
    fixtures: &[Fixture],
) -> Result<CheckReport> {
    let mut report = CheckReport::new("Golden manifest check");

    for fixture in fixtures {
        let golden = golden_path_for(&fixture.values_file);
        if !golden.is_file() {
            tracing::debug!("No golden for {}; skipping", fixture.values_file.display());
            continue;
        }

        let rendered = harness.render(&render_request(fixture))?;
        if let GoldenComparison::Mismatch { diff } = compare(&rendered, &golden)? {
            let diff: Vec<String> = diff.lines().map(|line| format!("      {line}")).collect();
            report.fail_with_hint(
                &fixture.chart_name,
                format!(
                    "Rendering of {} differs from {}\n{}",
                    ctx.display_path(&fixture.values_file),
                    ctx.display_path(&golden),
                    diff.join("\n")
                ),
                "Run `chartkit regenerate-goldens` if the change is intended",
            );
        }
    }

    Ok(report)
}

pub fn run_check(ctx: &Context) -> Result<()> {
    let fixtures = fixtures(ctx)?;
    if fixtures.is_empty() {
        return Err(no_fixtures(ctx));
    }

    let mut harness = ctx.harness()?;
    check(ctx, &mut harness, &fixtures)?.finish("Every golden file matches its rendering")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartkit_helm::{CommandOutput, MockRunner, NetworkPolicy};
    use std::path::Path;

    const RENDERED: &str = "---\n# Source: web/templates/cm.yaml\nkind: ConfigMap\n";

    fn repo(root: &Path) {
        let chart = root.join("charts/web");
        fs::create_dir_all(&chart).unwrap();
        fs::write(chart.join("Chart.yaml"), "name: web\nversion: 0.1.0\n").unwrap();

        let fixtures = root.join("tests/fixtures/web");
        fs::create_dir_all(&fixtures).unwrap();
        fs::write(fixtures.join("minimal-values.yaml"), "{}\n").unwrap();
        fs::write(fixtures.join("ha-values.yaml"), "replicaCount: 3\n").unwrap();
        fs::write(fixtures.join("shared.yaml"), "{}\n").unwrap();

        // fixtures for a chart that no longer exists are ignored
        let orphan = root.join("tests/fixtures/gone");
        fs::create_dir_all(&orphan).unwrap();
        fs::write(orphan.join("minimal-values.yaml"), "{}\n").unwrap();
    }

    #[test]
    fn test_fixture_discovery() {
        let tmp = tempfile::tempdir().unwrap();
        repo(tmp.path());
        let ctx = Context::open(tmp.path(), None, true).unwrap();

        let names: Vec<String> = fixtures(&ctx)
            .unwrap()
            .iter()
            .map(|f| format!("{}/{}", f.chart_name, file_name(&f.values_file)))
            .collect();
        assert_eq!(names, vec!["web/ha-values.yaml", "web/minimal-values.yaml"]);
    }

    #[test]
    fn test_regenerate_writes_normalized_and_skips_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        repo(tmp.path());
        let ctx = Context::open(tmp.path(), None, true).unwrap();

        let runner = MockRunner::new();
        runner.respond(&["template"], CommandOutput::ok(format!("{RENDERED}\n\n  \n")));
        let mut harness = Harness::with_runner("helm", NetworkPolicy::Disabled, runner.clone());

        let fixture = &fixtures(&ctx).unwrap()[0];
        assert_eq!(regenerate(&mut harness, fixture).unwrap(), GoldenUpdate::Updated);
        let golden = golden_path_for(&fixture.values_file);
        assert_eq!(fs::read_to_string(&golden).unwrap(), RENDERED);

        assert_eq!(regenerate(&mut harness, fixture).unwrap(), GoldenUpdate::Unchanged);

        let args = &runner.calls(&["template"])[0].args;
        assert_eq!(args[1], "web");
        assert_eq!(args[3], "--values");
        assert!(args[4].ends_with("ha-values.yaml"));
    }

    #[test]
    fn test_render_failure_leaves_golden_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        repo(tmp.path());
        let ctx = Context::open(tmp.path(), None, true).unwrap();
        let fixture = &fixtures(&ctx).unwrap()[1];
        let golden = golden_path_for(&fixture.values_file);
        fs::write(&golden, "old\n").unwrap();

        let runner = MockRunner::new();
        runner.fail(&["template"], "Error: parse error in deployment.yaml");
        let mut harness = Harness::with_runner("helm", NetworkPolicy::Disabled, runner);

        let err = regenerate(&mut harness, fixture).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::TEMPLATE_ERROR);
        assert_eq!(fs::read_to_string(&golden).unwrap(), "old\n");
    }

    #[test]
    fn test_check_reports_mismatch_with_diff() {
        let tmp = tempfile::tempdir().unwrap();
        repo(tmp.path());
        let fixtures_dir = tmp.path().join("tests/fixtures/web");
        fs::write(fixtures_dir.join("minimal-values.golden.yaml"), RENDERED).unwrap();
        fs::write(fixtures_dir.join("ha-values.golden.yaml"), "old\n").unwrap();
        let ctx = Context::open(tmp.path(), None, true).unwrap();

        let runner = MockRunner::new();
        runner.respond(&["template"], CommandOutput::ok(format!("{RENDERED}\n")));
        let mut harness = Harness::with_runner("helm", NetworkPolicy::Disabled, runner.clone());

        let report = check(&ctx, &mut harness, &fixtures(&ctx).unwrap()).unwrap();
        assert_eq!(runner.count(&["template"]), 2);
        assert_eq!(report.issues().len(), 1);

        let issue = &report.issues()[0];
        assert_eq!(issue.chart.as_deref(), Some("web"));
        assert!(issue.message.starts_with(
            "Rendering of tests/fixtures/web/ha-values.yaml differs from tests/fixtures/web/ha-values.golden.yaml\n"
        ));
        assert!(issue.message.contains("-old"));
        assert!(issue.message.contains("+kind: ConfigMap"));
    }

    #[test]
    fn test_check_skips_fixtures_without_golden() {
        let tmp = tempfile::tempdir().unwrap();
        repo(tmp.path());
        let fixtures_dir = tmp.path().join("tests/fixtures/web");
        fs::write(fixtures_dir.join("minimal-values.golden.yaml"), RENDERED).unwrap();
        let ctx = Context::open(tmp.path(), None, true).unwrap();

        let runner = MockRunner::new();
        runner.respond(&["template"], CommandOutput::ok(format!("{RENDERED}\n\n")));
        let mut harness = Harness::with_runner("helm", NetworkPolicy::Disabled, runner.clone());

        let report = check(&ctx, &mut harness, &fixtures(&ctx).unwrap()).unwrap();
        assert!(report.is_ok());

        let templates = runner.calls(&["template"]);
        assert_eq!(templates.len(), 1);
        assert!(templates[0].args[4].ends_with("minimal-values.yaml"));
    }

    #[test]
    fn test_check_propagates_render_failure() {
        let tmp = tempfile::tempdir().unwrap();
        repo(tmp.path());
        fs::write(tmp.path().join("tests/fixtures/web/minimal-values.golden.yaml"), RENDERED).unwrap();
        let ctx = Context::open(tmp.path(), None, true).unwrap();

        let runner = MockRunner::new();
        runner.fail(&["template"], "Error: parse error in deployment.yaml");
        let mut harness = Harness::with_runner("helm", NetworkPolicy::Disabled, runner);

        let err = check(&ctx, &mut harness, &fixtures(&ctx).unwrap()).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::TEMPLATE_ERROR);
    }
}
