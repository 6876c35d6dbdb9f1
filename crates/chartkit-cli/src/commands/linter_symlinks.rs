//! Linter symlink check
//!
//! Each chart's linter values file must be a symlink to the chart's minimal
//! values fixture, so `helm lint` sees the same values the tests render with.

use std::fs;

use super::{Context, file_name};
use crate::display::CheckReport;
use crate::error::Result;

pub fn check(ctx: &Context) -> Result<CheckReport> {
    let mut report = CheckReport::new("Linter symlink check");
    let link_name = &ctx.layout.config().linter_values_file;

    for chart_dir in ctx.layout.charts_with_manifests() {
        let chart_name = file_name(&chart_dir);
        let link = chart_dir.join(link_name);
        let expected = ctx.layout.chart(chart_name.as_str()).default_values_file();

        let is_symlink = fs::symlink_metadata(&link)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);

        if !link.exists() && !is_symlink {
            report.fail(
                &chart_name,
                format!("Missing {}: {}", link_name, ctx.display_path(&link)),
            );
            continue;
        }

        if !is_symlink {
            report.fail_with_hint(
                &chart_name,
                format!("{} is not a symlink: {}", link_name, ctx.display_path(&link)),
                format!("Replace it with a link to {}", ctx.display_path(&expected)),
            );
            continue;
        }

        if !expected.is_file() {
            report.fail(
                &chart_name,
                format!(
                    "Expected values fixture does not exist: {}",
                    ctx.display_path(&expected)
                ),
            );
            continue;
        }

        let resolved = fs::canonicalize(&link).ok();
        if resolved != fs::canonicalize(&expected).ok() {
            let target = fs::read_link(&link)
                .map(|t| t.display().to_string())
                .unwrap_or_default();
            report.fail(
                &chart_name,
                format!(
                    "{} points at the wrong target: {} -> {} (expected {})",
                    link_name,
                    ctx.display_path(&link),
                    target,
                    ctx.display_path(&expected)
                ),
            );
        }
    }

    Ok(report)
}

pub fn run(ctx: &Context) -> Result<()> {
    check(ctx)?.finish("Every linter values file links to its minimal values fixture")
}
