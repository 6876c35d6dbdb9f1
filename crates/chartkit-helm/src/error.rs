//! Error types for harness operations

use chartkit_core::CoreError;
use thiserror::Error;

/// Harness errors
#[derive(Debug, Error)]
pub enum HelmError {
    // ============ Configuration Errors ============
    #[error("Helm binary not found: {message}")]
    BinaryNotFound { message: String },

    // ============ Invocation Errors ============
    /// The tool ran and exited non-zero
    #[error("{}", describe_invocation(.command, .stderr))]
    ToolInvocation { command: Vec<String>, stderr: String },

    /// The tool could not be started at all
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ============ Passthrough ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl HelmError {
    /// Build a tool invocation failure; stderr is trimmed
    pub fn invocation(command: Vec<String>, stderr: &str) -> Self {
        HelmError::ToolInvocation {
            command,
            stderr: stderr.trim().to_string(),
        }
    }

    /// Full command line of a failed invocation
    pub fn command_line(&self) -> Option<String> {
        match self {
            HelmError::ToolInvocation { command, .. } => Some(command.join(" ")),
            _ => None,
        }
    }

    /// Captured stderr of a failed invocation
    pub fn stderr(&self) -> Option<&str> {
        match self {
            HelmError::ToolInvocation { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn describe_invocation(command: &[String], stderr: &str) -> String {
    let line = command.join(" ");
    if stderr.is_empty() {
        format!("{line} failed")
    } else {
        format!("{line} failed: {stderr}")
    }
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HelmError>;
