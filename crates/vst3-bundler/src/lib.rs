//! Build a plugin crate and assemble its VST3 bundle.
//!
//! A run goes through four stages:
//!
//! 1. prepare the toolchain environment (scoped, never written to our own env)
//! 2. `cargo build --target <triple>`
//! 3. bundle with the packaging helper (`cargo xtask bundle` by default)
//! 4. if the helper fails, build `<bundle>.vst3/Contents/<platform>/` by hand
//!    and copy the binary in
//!
//! See [`pipeline`] for the state machine and [`config`] for the file format.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod process;
pub mod stages;
pub mod target;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{Config, Overrides, PluginEntry};
pub use descriptor::PluginDescriptor;
pub use error::{ConfigError, PipelineError};
pub use layout::BundleLayout;
pub use pipeline::{BundleMethod, Outcome, Pipeline, PipelineConfig, PipelineReport, Stage};
pub use process::{CommandRunner, SystemRunner};
pub use target::{BuildTarget, Profile};
