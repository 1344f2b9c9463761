//! Error types for the build-and-bundle pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a pipeline stage.
///
/// Only `PackagingHelperFailed` is recoverable: the pipeline answers it with
/// the manual bundling stage instead of aborting.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("toolchain not found: {reason}")]
    ToolchainMissing { reason: String },

    #[error("build failed: {reason}")]
    BuildFailed { reason: String },

    #[error("packaging helper failed: {reason}")]
    PackagingHelperFailed { reason: String },

    #[error("manual bundle failed: could not {action} {}: {source}", .path.display())]
    ManualBundleFailed {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Problems with the configuration handed to the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported target triple '{0}'")]
    UnsupportedTarget(String),

    #[error("invalid {field} '{value}': {reason}")]
    InvalidName {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("packaging command is empty")]
    EmptyPackagingCommand,

    #[error("cargo '{0}' must be a program name on PATH or an absolute path")]
    RelativeCargoPath(String),

    #[error("plugin '{0}' is not listed in the config")]
    UnknownPlugin(String),

    #[error("reading config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
