//! Harness configuration
//!
//! Fixed at construction and read-only for the rest of the session.

use std::path::PathBuf;

/// Environment variable naming an explicit Helm binary
pub const ENV_HELM_BIN: &str = "CHARTKIT_HELM_BIN";

/// Environment variable that disables network operations when truthy
pub const ENV_SKIP_NETWORK: &str = "CHARTKIT_SKIP_HELM_NETWORK";

/// Whether repository registration, index refresh and dependency builds may
/// touch the network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkPolicy {
    #[default]
    Allowed,
    /// Offline: trust pre-built dependencies, never call out
    Disabled,
}

impl NetworkPolicy {
    pub fn allows_network(self) -> bool {
        matches!(self, NetworkPolicy::Allowed)
    }
}

impl From<bool> for NetworkPolicy {
    fn from(allowed: bool) -> Self {
        if allowed {
            NetworkPolicy::Allowed
        } else {
            NetworkPolicy::Disabled
        }
    }
}

/// Configuration recognized at harness construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Explicit Helm binary; `helm` on `PATH` when unset
    pub helm_binary: Option<PathBuf>,

    pub network: NetworkPolicy,
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn helm_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.helm_binary = Some(path.into());
        self
    }

    pub fn network(mut self, network: impl Into<NetworkPolicy>) -> Self {
        self.network = network.into();
        self
    }

    /// Read [`ENV_HELM_BIN`] and [`ENV_SKIP_NETWORK`] from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let helm_binary = lookup(ENV_HELM_BIN)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let skip_network = lookup(ENV_SKIP_NETWORK).is_some_and(|v| is_truthy(&v));

        Self {
            helm_binary,
            network: NetworkPolicy::from(!skip_network),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
