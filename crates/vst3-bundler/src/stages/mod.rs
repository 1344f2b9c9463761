//! The three stages that follow environment preparation.
//!
//! Each stage is a function returning `Result<_, PipelineError>`; wiring them
//! together, including the fallback from the helper to manual bundling, is
//! the pipeline's job.

pub mod compile;
pub mod helper;
pub mod manual;

pub use compile::compile;
pub use helper::{bundle_with_helper, PackagingConfig};
pub use manual::bundle_manually;
