use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::pipeline::PipelineConfig;
use crate::process::{CommandRunner, Invocation};
use crate::target::BuildTarget;
use crate::toolchain::ToolchainEnv;

/// Packaging helper command template.
///
/// Placeholders: `{cargo}`, `{plugin}`, `{triple}`, `{profile}`. When the
/// template does not mention `{profile}` the release flag is appended for
/// release builds; when it does not mention `{triple}`, `--target <triple>`
/// is appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingConfig {
    pub enabled: bool,
    pub command: Vec<String>,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: ["{cargo}", "xtask", "bundle", "{plugin}"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl PackagingConfig {
    pub fn render(&self, cargo: &str, plugin: &str, target: &BuildTarget) -> Vec<String> {
        if self.command.is_empty() {
            return Vec::new();
        }
        let profile = target.profile();
        let mut rendered: Vec<String> = self
            .command
            .iter()
            .map(|part| {
                part.replace("{cargo}", cargo)
                    .replace("{plugin}", plugin)
                    .replace("{triple}", target.triple())
                    .replace("{profile}", profile.dir_name())
            })
            .collect();

        if !self.mentions("{profile}") {
            rendered.extend(profile.cargo_flag().map(String::from));
        }
        if !self.mentions("{triple}") {
            rendered.push("--target".to_string());
            rendered.push(target.triple().to_string());
        }
        rendered
    }

    fn mentions(&self, placeholder: &str) -> bool {
        self.command.iter().any(|part| part.contains(placeholder))
    }
}

pub fn helper_invocation(config: &PipelineConfig, env: &ToolchainEnv) -> Option<Invocation> {
    let rendered = config.packaging.render(
        &config.toolchain.cargo,
        &config.plugin.plugin_name,
        &config.target,
    );
    let (program, args) = rendered.split_first()?;
    Some(
        Invocation::new(program)
            .args(args)
            .current_dir(&config.source_root)
            .env(env),
    )
}

/// Run the packaging helper. The exit status is the only thing checked;
/// the bundle it produces is taken on trust.
pub fn bundle_with_helper(
    runner: &dyn CommandRunner,
    config: &PipelineConfig,
    env: &ToolchainEnv,
) -> Result<(), PipelineError> {
    let failed = |reason: String| PipelineError::PackagingHelperFailed { reason };

    let invocation =
        helper_invocation(config, env).ok_or_else(|| failed("no packaging command".into()))?;
    info!(plugin = %config.plugin.plugin_name, "bundling with packaging helper");
    debug!(command = %invocation, "spawning packaging helper");

    let exit = runner
        .status(&invocation)
        .map_err(|e| failed(format!("could not run `{invocation}`: {e}")))?;
    if !exit.success() {
        return Err(failed(format!("`{invocation}` failed with {exit}")));
    }
    Ok(())
}
