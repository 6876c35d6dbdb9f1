//! The rendering session
//!
//! A [`Harness`] owns the repository catalog and the set of built charts for
//! one test session. Create it once and pass it to every render; nothing is
//! shared between harness instances.

use chartkit_core::{ChartContext, Overrides, RepoLayout, Values};
use std::path::{Path, PathBuf};

use crate::build::BuildOutcome;
use crate::config::{HarnessConfig, NetworkPolicy};
use crate::error::Result;
use crate::helm::{HelmCli, locate_binary};
use crate::renderer::{ChartRenderer, RenderRequest};
use crate::runner::{CommandRunner, ProcessRunner};

/// Summary of a prefetch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Charts whose dependencies were built by this pass
    pub built: Vec<PathBuf>,
    /// Charts already built earlier in the session
    pub cached: Vec<PathBuf>,
    /// True when the pass was skipped because the network is disabled
    pub skipped: bool,
}

/// One rendering session over a Helm binary
#[derive(Debug)]
pub struct Harness<R = ProcessRunner> {
    renderer: ChartRenderer<R>,
    network: NetworkPolicy,
}

impl Harness<ProcessRunner> {
    /// Resolve the Helm binary and start a session
    ///
    /// Fails with [`HelmError::BinaryNotFound`](crate::HelmError::BinaryNotFound)
    /// right away when no usable binary is found.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let binary = locate_binary(config.helm_binary.as_deref())?;
        tracing::debug!(helm = %binary.display(), network = ?config.network, "harness ready");
        Ok(Self::with_runner(binary, config.network, ProcessRunner))
    }
}

impl<R: CommandRunner> Harness<R> {
    /// Start a session over an arbitrary runner; the binary is not checked
    pub fn with_runner(binary: impl Into<PathBuf>, network: NetworkPolicy, runner: R) -> Self {
        Self {
            renderer: ChartRenderer::new(HelmCli::new(binary, runner), network),
            network,
        }
    }

    pub fn network(&self) -> NetworkPolicy {
        self.network
    }

    pub fn helm(&self) -> &HelmCli<R> {
        self.renderer.helm()
    }

    pub fn renderer(&self) -> &ChartRenderer<R> {
        &self.renderer
    }

    /// Render a request
    pub fn render(&mut self, request: &RenderRequest) -> Result<String> {
        self.renderer.render(request)
    }

    /// Build a chart's dependencies unless already done this session
    pub fn ensure_built(&mut self, chart_dir: &Path) -> Result<BuildOutcome> {
        self.renderer.ensure_built(chart_dir)
    }

    /// Render a chart from the repository layout
    ///
    /// Without `values_files` the chart's default fixture is used. Structured
    /// `overrides` are written to a temporary values file layered last.
    pub fn render_chart(
        &mut self,
        chart: &ChartContext,
        values_files: Option<&[PathBuf]>,
        overrides: Option<&Overrides>,
    ) -> Result<String> {
        let files = match values_files {
            Some(files) => files.to_vec(),
            None => vec![chart.default_values_file()],
        };

        let mut request = RenderRequest::new(chart.release(), chart.chart_dir()).values_files(files);

        // held until the render completes; dropping it deletes the file
        let overrides_file = match overrides {
            Some(overrides) if !overrides.is_empty() => {
                Some(Values::from_overrides(overrides)?.write_temp()?)
            }
            _ => None,
        };
        if let Some(file) = &overrides_file {
            request = request.values_file(file.path());
        }

        self.render(&request)
    }

    /// Build dependencies for every chart in the layout
    ///
    /// Meant to run once from a single coordinating process before parallel
    /// workers start. Stops at the first failure.
    pub fn prefetch(&mut self, layout: &RepoLayout) -> Result<PrefetchReport> {
        let mut report = PrefetchReport::default();

        if !self.network.allows_network() {
            tracing::info!("Skipping dependency prefetch (network disabled)");
            report.skipped = true;
            return Ok(report);
        }

        for chart_dir in layout.charts_with_manifests() {
            tracing::info!("Prefetching dependencies for {}", chart_dir.display());
            match self.ensure_built(&chart_dir)? {
                BuildOutcome::Cached => report.cached.push(chart_dir),
                _ => report.built.push(chart_dir),
            }
        }

        Ok(report)
    }
}
