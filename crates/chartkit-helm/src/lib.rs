//! chartkit Helm harness
//!
//! Renders charts through the Helm CLI, making sure every chart's
//! dependencies are in place first:
//!
//! - **Repository discovery**: repositories a chart depends on are
//!   registered automatically under collision-free `auto-` names
//! - **Single refresh**: `helm repo update` runs at most once per session
//! - **Build cache**: `helm dependency build` runs at most once per chart
//! - **Offline mode**: with the network disabled, only `helm template` runs
//!
//! ## Example
//!
//! ```rust,no_run
//! use chartkit_helm::{Harness, HarnessConfig, RenderRequest};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut harness = Harness::new(HarnessConfig::from_env())?;
//!
//! let request = RenderRequest::new("web", "charts/web")
//!     .values_file("tests/fixtures/web/minimal-values.yaml")
//!     .set("image.tag", "1.2.3");
//! let manifest = harness.render(&request)?;
//! println!("{manifest}");
//! # Ok(())
//! # }
//! ```
//!
//! All subprocess calls go through [`CommandRunner`]; tests swap in
//! [`MockRunner`] to assert exactly which Helm verbs would have run.

pub mod build;
pub mod catalog;
pub mod config;
pub mod dependency;
pub mod error;
pub mod harness;
pub mod helm;
pub mod mock;
pub mod renderer;
pub mod runner;

pub use build::{BuildCache, BuildOutcome, canonical_chart_path};
pub use catalog::{Repository, RepositoryCatalog, parse_repo_list};
pub use config::{ENV_HELM_BIN, ENV_SKIP_NETWORK, HarnessConfig, NetworkPolicy};
pub use dependency::{DependencyResolver, Reconciliation, is_remote_repository};
pub use error::{HelmError, Result};
pub use harness::{Harness, PrefetchReport};
pub use helm::{HelmCli, locate_binary};
pub use mock::{Invocation, MockRunner};
pub use renderer::{ChartRenderer, RenderRequest};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
