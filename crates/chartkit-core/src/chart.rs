//! Chart.yaml definition and loading
//!
//! Decoding is deliberately forgiving: fields the harness does not need may be
//! missing or oddly typed, and a malformed `dependencies` entry is dropped
//! instead of failing the whole manifest.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Helm chart descriptor (`Chart.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartManifest {
    /// API version (v1 or v2)
    #[serde(default, deserialize_with = "scalar_string")]
    pub api_version: Option<String>,

    /// Chart name
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,

    /// Chart version (SemVer)
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,

    /// Chart type (application or library)
    #[serde(default, rename = "type", deserialize_with = "scalar_string")]
    pub chart_type: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub app_version: Option<String>,

    /// Declared sub-chart dependencies
    #[serde(default, deserialize_with = "lenient_dependencies")]
    pub dependencies: Vec<ChartDependency>,
}

/// A dependency entry from `Chart.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,

    /// Version constraint
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,

    /// Repository URL (or alias like `@stable`)
    #[serde(default, deserialize_with = "scalar_string")]
    pub repository: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub condition: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub alias: Option<String>,
}

impl ChartManifest {
    /// Descriptor file name inside a chart directory
    pub const FILE_NAME: &'static str = "Chart.yaml";

    /// Path of the descriptor inside `chart_dir`
    pub fn path_in(chart_dir: &Path) -> PathBuf {
        chart_dir.join(Self::FILE_NAME)
    }

    /// Parse a manifest from YAML text
    ///
    /// An empty or null document yields an empty manifest.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        match raw {
            serde_yaml::Value::Null => Ok(Self::default()),
            serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(raw)?),
            _ => Err(CoreError::InvalidChart {
                message: "top-level document is not a mapping".to_string(),
            }),
        }
    }

    /// Load `Chart.yaml` from a chart directory
    pub fn load<P: AsRef<Path>>(chart_dir: P) -> Result<Self> {
        let path = Self::path_in(chart_dir.as_ref());
        if !path.is_file() {
            return Err(CoreError::ChartNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    /// Repository URLs referenced by dependencies, in declaration order
    ///
    /// Empty entries are skipped and duplicates collapse onto their first
    /// occurrence.
    pub fn dependency_repositories(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for dep in &self.dependencies {
            let Some(url) = dep.repository.as_deref().map(str::trim) else {
                continue;
            };
            if url.is_empty() || urls.iter().any(|u| u == url) {
                continue;
            }
            urls.push(url.to_string());
        }
        urls
    }

    /// Parse the chart version as SemVer, if one is declared
    pub fn semver(&self) -> Option<Result<semver::Version>> {
        self.version
            .as_deref()
            .map(|v| semver::Version::parse(v.trim()).map_err(CoreError::from))
    }
}

/// Whether a directory holds a chart descriptor
pub fn is_chart_dir(path: &Path) -> bool {
    ChartManifest::path_in(path).is_file()
}

/// Accept strings, numbers and booleans as strings; treat anything else as absent
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_dependencies<'de, D>(deserializer: D) -> std::result::Result<Vec<ChartDependency>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    let Some(serde_yaml::Value::Sequence(items)) = raw else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter(serde_yaml::Value::is_mapping)
        .filter_map(|item| serde_yaml::from_value(item).ok())
        .collect())
}
