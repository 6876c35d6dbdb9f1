//! Fixture check - every chart has fixtures and every values fixture a golden

use chartkit_core::golden::{golden_path_for, is_values_fixture};

use super::{Context, file_name, yaml_files};
use crate::display::CheckReport;
use crate::error::Result;

/// Collect fixture problems for every chart with a `Chart.yaml`
pub fn check(ctx: &Context) -> Result<CheckReport> {
    let mut report = CheckReport::new("Fixture check");

    for chart_dir in ctx.layout.charts_with_manifests() {
        let chart_name = file_name(&chart_dir);
        let fixture_dir = ctx.layout.chart(chart_name.as_str()).fixtures_dir();

        if !fixture_dir.is_dir() {
            report.fail(
                &chart_name,
                format!(
                    "Missing fixtures directory: {}",
                    ctx.display_path(&fixture_dir)
                ),
            );
            continue;
        }

        for values_file in yaml_files(&fixture_dir)? {
            if !is_values_fixture(&file_name(&values_file)) {
                continue;
            }

            let golden = golden_path_for(&values_file);
            if !golden.is_file() {
                report.fail_with_hint(
                    &chart_name,
                    format!(
                        "Missing golden file for fixture {} (expected {})",
                        ctx.display_path(&values_file),
                        ctx.display_path(&golden)
                    ),
                    "Run `chartkit regenerate-goldens` to create it",
                );
            }
        }
    }

    Ok(report)
}

pub fn run(ctx: &Context) -> Result<()> {
    check(ctx)?.finish("Every values fixture has a golden file")
}
