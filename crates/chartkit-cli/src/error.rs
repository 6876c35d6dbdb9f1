//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use chartkit_core::CoreError;
use chartkit_helm::HelmError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// A repository check found problems
    #[error("{check} failed with {failures} problem(s)")]
    #[diagnostic(code(chartkit::cli::check))]
    CheckFailed { check: String, failures: usize },

    /// Helm exited non-zero
    #[error("Template error: {message}")]
    #[diagnostic(code(chartkit::cli::template))]
    Template {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart structure, manifest or rendering content problem
    #[error("Chart error: {message}")]
    #[diagnostic(code(chartkit::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartkit::cli::io))]
    Io { message: String },

    /// Bad arguments or configuration
    #[error("{message}")]
    #[diagnostic(code(chartkit::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// An external command other than Helm failed
    #[error("{message}")]
    #[diagnostic(code(chartkit::cli::command))]
    Command { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::CheckFailed { .. } => exit_codes::ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Command { .. } => exit_codes::ERROR,
        }
    }

    /// Create a check failure
    pub fn check_failed(check: impl Into<String>, failures: usize) -> Self {
        Self::CheckFailed {
            check: check.into(),
            failures,
        }
    }

    /// Create a chart error
    pub fn chart(message: impl Into<String>) -> Self {
        Self::Chart {
            message: message.into(),
            help: None,
        }
    }

    /// Create a usage error (user provided invalid input)
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an external command failure
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => e.into(),
            CoreError::InvalidOverride { .. } | CoreError::InvalidConfig { .. } => {
                CliError::usage(err.to_string())
            }
            other => CliError::chart(other.to_string()),
        }
    }
}

impl From<HelmError> for CliError {
    fn from(err: HelmError) -> Self {
        match err {
            HelmError::BinaryNotFound { .. } => CliError::usage_with_help(
                err.to_string(),
                format!(
                    "Install Helm, or point --helm-bin / {} at the binary",
                    chartkit_helm::ENV_HELM_BIN
                ),
            ),
            HelmError::ToolInvocation { .. } => CliError::Template {
                message: err.to_string(),
                help: Some("Run with --debug to see every Helm invocation".to_string()),
            },
            HelmError::Spawn { .. } => CliError::Io {
                message: err.to_string(),
            },
            HelmError::Io(e) => e.into(),
            HelmError::Core(e) => e.into(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
