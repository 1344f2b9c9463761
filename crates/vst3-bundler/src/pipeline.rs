//! The build-and-bundle pipeline.
//!
//! ```text
//! PrepareEnv --fail--> Abort(ToolchainMissing)
//!     |
//! Compile ----fail--> Abort(BuildFailed)
//!     |
//! Bundle -----ok----> Done(Helper)
//!     |fail
//! ManualBundle --ok--> Done(Manual)
//!     |fail
//! Abort(ManualBundleFailed)
//! ```

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::descriptor::PluginDescriptor;
use crate::error::PipelineError;
use crate::layout::BundleLayout;
use crate::process::CommandRunner;
use crate::stages::{self, PackagingConfig};
use crate::target::BuildTarget;
use crate::toolchain::{self, ToolchainConfig};

/// Everything one pipeline run needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub plugin: PluginDescriptor,
    pub target: BuildTarget,
    pub source_root: PathBuf,
    pub toolchain: ToolchainConfig,
    pub packaging: PackagingConfig,
}

impl PipelineConfig {
    pub fn layout(&self) -> BundleLayout {
        BundleLayout::new(&self.source_root, &self.plugin, &self.target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    PrepareEnv,
    Compile,
    Bundle,
    ManualBundle,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PrepareEnv => "prepare-env",
            Self::Compile => "compile",
            Self::Bundle => "bundle",
            Self::ManualBundle => "manual-bundle",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BundleMethod {
    Helper,
    Manual,
}

impl fmt::Display for BundleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Helper => "packaging helper",
            Self::Manual => "manual fallback",
        })
    }
}

#[derive(Debug)]
pub enum Outcome {
    Done {
        bundled_by: BundleMethod,
        bundle_path: PathBuf,
    },
    Abort {
        stage: Stage,
        error: PipelineError,
    },
}

/// Result of one run, consumed by the caller as an exit status.
#[derive(Debug)]
pub struct PipelineReport {
    pub plugin: String,
    pub outcome: Outcome,
}

impl PipelineReport {
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, Outcome::Done { .. })
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_done())
    }
}

/// Runs the stages for one plugin.
///
/// Runs against the same `target/` directory are not synchronized; callers
/// must not run two pipelines on one source root at the same time.
pub struct Pipeline<R> {
    config: PipelineConfig,
    runner: R,
    skip_helper: bool,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        let skip_helper = !config.packaging.enabled;
        Self {
            config,
            runner,
            skip_helper,
        }
    }

    /// Go straight from compilation to manual bundling.
    #[must_use]
    pub fn skip_helper(mut self, skip: bool) -> Self {
        self.skip_helper |= skip;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&self) -> PipelineReport {
        let outcome = match self.execute() {
            Ok((bundled_by, bundle_path)) => Outcome::Done {
                bundled_by,
                bundle_path,
            },
            Err((stage, error)) => Outcome::Abort { stage, error },
        };
        PipelineReport {
            plugin: self.config.plugin.plugin_name.clone(),
            outcome,
        }
    }

    fn execute(&self) -> Result<(BundleMethod, PathBuf), (Stage, PipelineError)> {
        let config = &self.config;
        let layout = config.layout();

        let env = toolchain::prepare(&config.toolchain, &self.runner)
            .map_err(|e| (Stage::PrepareEnv, e))?;

        stages::compile(&self.runner, config, &layout, &env).map_err(|e| (Stage::Compile, e))?;

        if self.skip_helper {
            info!("packaging helper disabled");
        } else {
            match stages::bundle_with_helper(&self.runner, config, &env) {
                Ok(()) => return Ok((BundleMethod::Helper, layout.bundle_dir)),
                Err(e) => warn!(error = %e, "falling back to manual bundling"),
            }
        }

        let path = stages::bundle_manually(&layout).map_err(|e| (Stage::ManualBundle, e))?;
        Ok((BundleMethod::Manual, path))
    }
}

/// Only the manual bundling stage, against a binary that is already built.
pub fn bundle_only(config: &PipelineConfig) -> PipelineReport {
    let outcome = match stages::bundle_manually(&config.layout()) {
        Ok(bundle_path) => Outcome::Done {
            bundled_by: BundleMethod::Manual,
            bundle_path,
        },
        Err(error) => Outcome::Abort {
            stage: Stage::ManualBundle,
            error,
        },
    };
    PipelineReport {
        plugin: config.plugin.plugin_name.clone(),
        outcome,
    }
}
