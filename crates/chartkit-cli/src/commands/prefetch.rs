//! Prefetch command - build all chart dependencies up front
//!
//! Run once from a single process before test workers start, so their own
//! builds are cache confirmations.

use console::style;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context) -> Result<()> {
    let mut harness = ctx.harness()?;
    let report = harness.prefetch(&ctx.layout)?;

    if report.skipped {
        println!(
            "{} Skipped dependency prefetch (network disabled)",
            style("⚠").yellow()
        );
        return Ok(());
    }

    for chart in &report.built {
        println!("  {} {}", style("✓").green(), ctx.display_path(chart));
    }
    println!(
        "{} Dependencies ready for {} chart(s)",
        style("✓").green().bold(),
        report.built.len() + report.cached.len()
    );
    Ok(())
}
