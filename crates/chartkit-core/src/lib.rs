//! chartkit Core - shared types for the chart test harness
//!
//! This crate provides the data types used throughout chartkit:
//! - `ChartManifest`: the `Chart.yaml` descriptor and its dependencies
//! - `Values`: layered values with dotted-key expansion
//! - `golden`: normalization and comparison of golden renderings
//! - `documents`: inspection of a rendered manifest stream
//! - `RepoLayout`: where charts and fixtures live in a repository

pub mod chart;
pub mod documents;
pub mod error;
pub mod golden;
pub mod layout;
pub mod values;

pub use chart::{ChartDependency, ChartManifest, is_chart_dir};
pub use documents::{find_kind, load_documents, primary_container};
pub use error::{CoreError, Result};
pub use golden::GoldenComparison;
pub use layout::{ChartContext, LayoutConfig, RepoLayout};
pub use values::{Overrides, Values};
