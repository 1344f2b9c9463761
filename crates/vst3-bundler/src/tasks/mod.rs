pub mod build;
pub mod doctor;
pub mod env;
pub mod paths;

use anyhow::{bail, Context, Result};

use vst3_bundler::config::DEFAULT_CONFIG_FILE;
use vst3_bundler::{Config, Outcome, PipelineConfig, PipelineReport, PluginEntry};

use crate::cli::PluginArgs;

/// Resolve the one plugin a command operates on.
///
/// A name not listed in a config that does list plugins is an error; with no
/// config at all the name and flags describe the plugin completely.
pub(crate) fn resolve_one(config: &Config, args: &PluginArgs) -> Result<PipelineConfig> {
    let name = match (&args.plugin, config.plugins.as_slice()) {
        (Some(name), _) => name.clone(),
        (None, [only]) => only.plugin_name.clone(),
        (None, []) => {
            bail!("No plugin given (pass a plugin name or list one in {DEFAULT_CONFIG_FILE})")
        }
        (None, _) => bail!("Several plugins are configured; name one or use `build --all`"),
    };

    let entry = if config.plugins.is_empty() {
        PluginEntry::named(&name)
    } else {
        config.entry(&name)?.clone()
    };

    config
        .resolve(&entry, &args.overrides())
        .with_context(|| format!("Resolving configuration for {name}"))
}

pub(crate) fn resolve_all(config: &Config, args: &PluginArgs) -> Result<Vec<PipelineConfig>> {
    if config.plugins.is_empty() {
        bail!("--all needs plugins listed in {DEFAULT_CONFIG_FILE}");
    }
    let overrides = args.overrides();
    config
        .plugins
        .iter()
        .map(|entry| {
            config
                .resolve(entry, &overrides)
                .with_context(|| format!("Resolving configuration for {}", entry.plugin_name))
        })
        .collect()
}

/// Print the outcome line and turn an abort into an error for `main`.
pub(crate) fn finish(report: PipelineReport) -> Result<()> {
    match report.outcome {
        Outcome::Done {
            bundled_by,
            bundle_path,
        } => {
            eprintln!(
                "[ok] {}: bundled by {} at {}",
                report.plugin,
                bundled_by,
                bundle_path.display()
            );
            Ok(())
        }
        Outcome::Abort { stage, error } => {
            eprintln!("[fail] {}: {error}", report.plugin);
            Err(anyhow::Error::new(error)
                .context(format!("{} aborted in the {stage} stage", report.plugin)))
        }
    }
}
