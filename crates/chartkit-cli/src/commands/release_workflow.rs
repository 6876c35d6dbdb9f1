//! Release workflow check
//!
//! The release workflow's `chart` dispatch input must offer exactly the chart
//! directories, sorted.

use serde_yaml::Value;
use std::collections::BTreeSet;

use super::Context;
use crate::display::CheckReport;
use crate::error::Result;

/// `on.workflow_dispatch.inputs.chart.options` of a workflow document
///
/// `Ok(None)` when the path is absent; `Err` when `options` is not a list.
fn chart_options(workflow: &Value) -> std::result::Result<Option<Vec<Value>>, ()> {
    let triggers = workflow
        .get("on")
        .or_else(|| workflow.get(Value::Bool(true)));

    let options = triggers
        .and_then(|t| t.get("workflow_dispatch"))
        .and_then(|d| d.get("inputs"))
        .and_then(|i| i.get("chart"))
        .and_then(|c| c.get("options"));

    match options {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Sequence(items)) => Ok(Some(items.clone())),
        Some(_) => Err(()),
    }
}

/// Compare workflow options against the chart directory names
pub fn compare(report: &mut CheckReport, options: &[String], charts: &[String]) {
    let mut sorted = options.to_vec();
    sorted.sort();

    if sorted != charts {
        let offered: BTreeSet<&String> = options.iter().collect();
        let present: BTreeSet<&String> = charts.iter().collect();

        report.fail_global("Release workflow chart options do not match the chart directories");
        let missing: Vec<&str> = present.difference(&offered).map(|s| s.as_str()).collect();
        if !missing.is_empty() {
            report.fail_global(format!("Missing in options: {}", missing.join(", ")));
        }
        let extra: Vec<&str> = offered.difference(&present).map(|s| s.as_str()).collect();
        if !extra.is_empty() {
            report.fail_global(format!("Extra in options: {}", extra.join(", ")));
        }
        if missing.is_empty() && extra.is_empty() {
            report.fail_global(format!("Options: {}", sorted.join(", ")));
            report.fail_global(format!("Charts:  {}", charts.join(", ")));
        }
        return;
    }

    if sorted != options {
        report.fail_global("Release workflow chart options should be sorted to match the chart directories");
    }
}

pub fn check(ctx: &Context) -> Result<CheckReport> {
    let mut report = CheckReport::new("Release workflow check");
    let path = ctx.layout.release_workflow();

    if !path.is_file() {
        report.fail_global(format!(
            "Release workflow not found: {}",
            ctx.display_path(&path)
        ));
        return Ok(report);
    }

    let workflow: Value = serde_yaml::from_str(&std::fs::read_to_string(&path)?)
        .map_err(chartkit_core::CoreError::from)?;

    let options = match chart_options(&workflow) {
        Ok(options) => options.unwrap_or_default(),
        Err(()) => {
            report.fail_global(format!(
                "{} chart options must be a list",
                ctx.display_path(&path)
            ));
            return Ok(report);
        }
    };

    let mut names = Vec::with_capacity(options.len());
    for option in &options {
        match option.as_str() {
            Some(name) => names.push(name.to_string()),
            None => report.fail_global(format!("Chart option is not a string: {option:?}")),
        }
    }

    compare(&mut report, &names, &ctx.layout.chart_dir_names());
    Ok(report)
}

pub fn run(ctx: &Context) -> Result<()> {
    check(ctx)?.finish("Release workflow offers every chart")
}
