//! Version bump check
//!
//! Any chart with files changed since the base ref must carry a strictly
//! higher `version` in its `Chart.yaml` than it had at the base ref.

use chartkit_core::ChartManifest;
use chartkit_helm::{CommandRunner, ProcessRunner};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::Context;
use crate::display::CheckReport;
use crate::error::Result;
use crate::git::{Git, normalize_relative};

/// Version assumed for a `Chart.yaml` that is empty at the base ref
pub const FALLBACK_VERSION: &str = "0.0.0";

/// Changed files keyed by (chart root, chart name), relative to the root
pub type ChartChanges = BTreeMap<(PathBuf, String), BTreeSet<PathBuf>>;

/// Group changed paths by the chart they belong to
///
/// A path counts for the first root it falls under; paths outside every
/// root are ignored.
pub fn group_changes_by_chart(paths: &[PathBuf], chart_roots: &[PathBuf]) -> ChartChanges {
    let roots: Vec<PathBuf> = chart_roots.iter().map(|r| normalize_relative(r)).collect();
    let mut grouped = ChartChanges::new();

    for path in paths {
        let path = normalize_relative(path);
        for root in &roots {
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let Some(chart) = relative.components().next() else {
                continue;
            };
            let chart = chart.as_os_str().to_string_lossy().into_owned();
            grouped
                .entry((root.clone(), chart))
                .or_default()
                .insert(relative.to_path_buf());
            break;
        }
    }

    grouped
}

/// Version declared by a `Chart.yaml` read from the base ref
///
/// An empty document or empty mapping counts as [`FALLBACK_VERSION`].
fn base_version(text: &str) -> std::result::Result<Option<String>, String> {
    let blank = text.trim().is_empty()
        || match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(serde_yaml::Value::Null) => true,
            Ok(serde_yaml::Value::Mapping(map)) => map.is_empty(),
            _ => false,
        };
    if blank {
        return Ok(Some(FALLBACK_VERSION.to_string()));
    }

    ChartManifest::from_yaml(text)
        .map(|manifest| manifest.version)
        .map_err(|e| e.to_string())
}

/// Check every changed chart against the base ref
///
/// Returns `None` when no chart changed.
pub fn check<R: CommandRunner>(
    git: &Git<R>,
    root: &Path,
    base_ref: &str,
    chart_roots: &[PathBuf],
) -> Result<Option<CheckReport>> {
    let changed = git.diff_names(base_ref, chart_roots)?;
    let charts = group_changes_by_chart(&changed, chart_roots);
    if charts.is_empty() {
        return Ok(None);
    }

    let mut report = CheckReport::new("Chart version bump required");

    for ((chart_root, chart), files) in &charts {
        let manifest_path = chart_root.join(chart).join(ChartManifest::FILE_NAME);

        let base = match git.show(base_ref, &manifest_path)? {
            // new chart, or no Chart.yaml at the base ref: nothing to compare
            None => continue,
            Some(text) => match base_version(&text) {
                Ok(Some(version)) => version,
                Ok(None) => continue,
                Err(e) => {
                    report.fail(chart, format!("Chart.yaml at {base_ref} could not be parsed: {e}"));
                    continue;
                }
            },
        };

        let chart_dir = root.join(chart_root).join(chart);
        let current = match ChartManifest::load(&chart_dir) {
            Ok(manifest) => manifest.version,
            Err(chartkit_core::CoreError::ChartNotFound { .. }) => None,
            Err(e) => {
                report.fail(chart, format!("Chart.yaml could not be read: {e}"));
                continue;
            }
        };
        let Some(current) = current else {
            report.fail(chart, format!("Chart '{chart}' changed but Chart.yaml has no version"));
            continue;
        };

        let (current_v, base_v) = match (Version::parse(current.trim()), Version::parse(base.trim())) {
            (Ok(c), Ok(b)) => (c, b),
            (Err(e), _) | (_, Err(e)) => {
                report.fail(chart, format!("Chart '{chart}' has an invalid version string: {e}"));
                continue;
            }
        };

        if current_v <= base_v {
            let changed_list = files
                .iter()
                .map(|f| chart_root.join(f).display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            report.fail_with_hint(
                chart,
                format!(
                    "Chart '{chart}' changed ({changed_list}) but version was not bumped above '{base}' (now '{current}')"
                ),
                format!("Bump `version` in {}", manifest_path.display()),
            );
        }
    }

    Ok(Some(report))
}

pub fn run(ctx: &Context, base_ref: Option<&str>, chart_roots: &[PathBuf]) -> Result<()> {
    let config = ctx.layout.config();
    let base_ref = base_ref.unwrap_or(&config.base_ref);
    let chart_roots = if chart_roots.is_empty() {
        config.chart_roots.clone()
    } else {
        chart_roots.to_vec()
    };

    let git = Git::new(ctx.layout.root(), ProcessRunner);
    match check(&git, ctx.layout.root(), base_ref, &chart_roots)? {
        None => {
            println!("No chart changes detected; skipping version bump check.");
            Ok(())
        }
        Some(report) => report.finish("Chart versions have been bumped for all modified charts."),
    }
}
