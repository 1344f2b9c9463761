use tracing::{debug, info};

use crate::error::PipelineError;
use crate::layout::BundleLayout;
use crate::pipeline::PipelineConfig;
use crate::process::{CommandRunner, Invocation};
use crate::toolchain::ToolchainEnv;

/// `cargo build [--release] --target <triple>`, run from the source root.
pub fn compile_invocation(config: &PipelineConfig, env: &ToolchainEnv) -> Invocation {
    let target = &config.target;
    Invocation::new(&config.toolchain.cargo)
        .arg("build")
        .args(target.profile().cargo_flag())
        .args(["--target", target.triple()])
        .current_dir(&config.source_root)
        .env(env)
}

/// Build the plugin. Succeeds only if cargo exits zero and the binary is
/// where the layout expects it.
pub fn compile(
    runner: &dyn CommandRunner,
    config: &PipelineConfig,
    layout: &BundleLayout,
    env: &ToolchainEnv,
) -> Result<(), PipelineError> {
    let invocation = compile_invocation(config, env);
    info!(plugin = %config.plugin.plugin_name, target = %config.target, "compiling");
    debug!(command = %invocation, "spawning compiler");

    let exit = runner
        .status(&invocation)
        .map_err(|e| PipelineError::BuildFailed {
            reason: format!("could not run `{invocation}`: {e}"),
        })?;
    if !exit.success() {
        return Err(PipelineError::BuildFailed {
            reason: format!("`{invocation}` failed with {exit}"),
        });
    }

    if !layout.compiled_binary.is_file() {
        return Err(PipelineError::BuildFailed {
            reason: format!(
                "cargo succeeded but {} was not produced (check binary_name)",
                layout.compiled_binary.display()
            ),
        });
    }

    info!(binary = %layout.compiled_binary.display(), "compiled");
    Ok(())
}
