//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: u8 = 0;

/// General error - a check failed or an unspecified failure
pub const ERROR: u8 = 1;

/// Template error - Helm exited non-zero while rendering or preparing a chart
pub const TEMPLATE_ERROR: u8 = 3;

/// Chart error - missing or invalid Chart.yaml, bad version, bad rendering
pub const CHART_ERROR: u8 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: u8 = 5;

/// Usage error - invalid arguments, options or configuration (sysexits.h)
pub const USAGE_ERROR: u8 = 64;
