//! Render command - `helm template` through the harness

use chartkit_helm::RenderRequest;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Context;
use crate::error::{CliError, Result};

/// Split a `--set` argument into key and value at the first `=`
pub fn parse_set(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::usage_with_help(
            format!("Invalid --set value '{arg}'"),
            "Use --set key=value, e.g. --set image.tag=1.2.3",
        )),
    }
}

/// Build the request for a `render` invocation
#[allow(clippy::too_many_arguments)]
pub fn build_request(
    ctx: &Context,
    release: &str,
    chart: &Path,
    values_files: &[PathBuf],
    set_values: &[String],
    namespace: Option<&str>,
    show_only: &[String],
    extra: &[String],
) -> Result<RenderRequest> {
    let mut request = RenderRequest::new(release, ctx.resolve(chart))
        .values_files(values_files.iter().map(|f| ctx.resolve(f)));

    if let Some(ns) = namespace {
        request = request.namespace(ns);
    }
    for arg in set_values {
        let (key, value) = parse_set(arg)?;
        request = request.set(key, value);
    }
    for target in show_only {
        request = request.show_only(target);
    }
    for arg in extra {
        request = request.extra_arg(arg);
    }

    Ok(request)
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    ctx: &Context,
    release: &str,
    chart: &Path,
    values_files: &[PathBuf],
    set_values: &[String],
    namespace: Option<&str>,
    show_only: &[String],
    extra: &[String],
) -> Result<()> {
    let request = build_request(
        ctx,
        release,
        chart,
        values_files,
        set_values,
        namespace,
        show_only,
        extra,
    )?;

    let mut harness = ctx.harness()?;
    let manifest = harness.render(&request)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(manifest.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
