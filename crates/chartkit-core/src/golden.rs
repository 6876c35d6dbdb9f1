//! Golden manifest comparison
//!
//! Rendered output and stored goldens are compared after normalization:
//! surrounding whitespace trimmed, exactly one trailing newline.

use similar::TextDiff;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Suffix that marks a golden rendering next to its values fixture
pub const GOLDEN_SUFFIX: &str = ".golden.yaml";

/// Outcome of comparing a rendering against its golden file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoldenComparison {
    /// Normalized rendering equals the golden file byte-for-byte
    Match,
    /// Contents differ; carries a unified diff (golden -> rendered)
    Mismatch { diff: String },
    /// No golden file exists yet
    Missing,
}

impl GoldenComparison {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Normalize rendered text for golden comparison
pub fn normalize(rendered: &str) -> String {
    let mut out = rendered.trim().to_string();
    out.push('\n');
    out
}

/// Compare a rendering with the golden file at `golden`
pub fn compare(rendered: &str, golden: &Path) -> Result<GoldenComparison> {
    if !golden.is_file() {
        return Ok(GoldenComparison::Missing);
    }

    let expected = std::fs::read_to_string(golden)?;
    let actual = normalize(rendered);
    if actual == expected {
        return Ok(GoldenComparison::Match);
    }

    let diff = TextDiff::from_lines(&expected, &actual)
        .unified_diff()
        .context_radius(3)
        .header(&golden.display().to_string(), "rendered")
        .to_string();
    Ok(GoldenComparison::Mismatch { diff })
}

/// Whether a file name denotes a golden rendering
pub fn is_golden_file(name: &str) -> bool {
    name.ends_with(GOLDEN_SUFFIX)
}

/// Whether a file name denotes a values fixture that needs a golden file
///
/// Any `.yaml` whose name contains `-values` and is not itself a golden.
pub fn is_values_fixture(name: &str) -> bool {
    name.ends_with(".yaml") && !is_golden_file(name) && name.contains("-values")
}

/// Golden path for a values fixture: `foo-values.yaml` -> `foo-values.golden.yaml`
pub fn golden_path_for(values_file: &Path) -> PathBuf {
    values_file.with_extension("golden.yaml")
}
