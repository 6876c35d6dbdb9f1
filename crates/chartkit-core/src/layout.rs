//! Repository layout: where charts, fixtures and the release workflow live
//!
//! Defaults match a conventional chart repository and can be overridden by a
//! `chartkit.yaml` file at the repository root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::chart::is_chart_dir;
use crate::error::{CoreError, Result};

/// Layout configuration file (`chartkit.yaml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Directory holding one sub-directory per chart
    pub charts_dir: PathBuf,

    /// Directory holding one fixtures sub-directory per chart
    pub fixtures_dir: PathBuf,

    /// Release workflow whose `chart` input must list every chart
    pub release_workflow: PathBuf,

    /// Values fixture used when a render names no values files
    pub default_values_file: String,

    /// Per-chart symlink that points the linter at the default values fixture
    pub linter_values_file: String,

    /// Roots scanned by the version-bump check
    pub chart_roots: Vec<PathBuf>,

    /// Git ref the version-bump check diffs against
    pub base_ref: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            charts_dir: PathBuf::from("charts"),
            fixtures_dir: PathBuf::from("tests/fixtures"),
            release_workflow: PathBuf::from(".github/workflows/release.yml"),
            default_values_file: "minimal-values.yaml".to_string(),
            linter_values_file: "linter_values.yaml".to_string(),
            chart_roots: vec![PathBuf::from("charts")],
            base_ref: "origin/main".to_string(),
        }
    }
}

impl LayoutConfig {
    pub const FILE_NAME: &'static str = "chartkit.yaml";

    /// Load `chartkit.yaml` from `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(Self::FILE_NAME);
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| CoreError::InvalidConfig {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Resolved repository layout rooted at a directory
#[derive(Debug, Clone)]
pub struct RepoLayout {
    root: PathBuf,
    config: LayoutConfig,
}

impl RepoLayout {
    /// Layout for `root`, reading `chartkit.yaml` if present
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = LayoutConfig::load(&root)?;
        Ok(Self { root, config })
    }

    pub fn with_config<P: AsRef<Path>>(root: P, config: LayoutConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.root.join(&self.config.charts_dir)
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.root.join(&self.config.fixtures_dir)
    }

    pub fn release_workflow(&self) -> PathBuf {
        self.root.join(&self.config.release_workflow)
    }

    /// Context for a chart in this layout
    pub fn chart(&self, chart_name: impl Into<String>) -> ChartContext {
        ChartContext {
            chart_name: chart_name.into(),
            release_name: None,
            charts_dir: self.charts_dir(),
            fixtures_dir: self.fixtures_dir(),
            default_values_file: self.config.default_values_file.clone(),
        }
    }

    /// Chart directories containing a `Chart.yaml`, sorted by name
    pub fn charts_with_manifests(&self) -> Vec<PathBuf> {
        subdirectories(&self.charts_dir())
            .into_iter()
            .filter(|dir| is_chart_dir(dir))
            .collect()
    }

    /// Names of every directory under the charts dir, sorted
    pub fn chart_dir_names(&self) -> Vec<String> {
        subdirectories(&self.charts_dir())
            .iter()
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

/// Sorted immediate sub-directories of `dir`; empty when `dir` is missing
pub fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

/// Metadata about a chart under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartContext {
    pub chart_name: String,
    pub release_name: Option<String>,
    charts_dir: PathBuf,
    fixtures_dir: PathBuf,
    default_values_file: String,
}

impl ChartContext {
    /// Override the release name used when rendering
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release_name = Some(release.into());
        self
    }

    pub fn chart_dir(&self) -> PathBuf {
        self.charts_dir.join(&self.chart_name)
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.fixtures_dir.join(&self.chart_name)
    }

    /// Values file used when a render names none
    pub fn default_values_file(&self) -> PathBuf {
        self.fixtures_dir().join(&self.default_values_file)
    }

    /// Release name, defaulting to the chart name
    pub fn release(&self) -> &str {
        self.release_name.as_deref().unwrap_or(&self.chart_name)
    }
}
