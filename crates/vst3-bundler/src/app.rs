use anyhow::{Context, Result};

use vst3_bundler::Config;

pub fn run(cli: crate::cli::Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Reading current directory")?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?.unwrap_or_default();

    match cli.cmd {
        crate::cli::Cmd::Build {
            plugin,
            all,
            no_helper,
        } => crate::tasks::build::run(&config, &plugin, all, no_helper),
        crate::cli::Cmd::Bundle { plugin } => crate::tasks::build::bundle_only(&config, &plugin),
        crate::cli::Cmd::Paths { plugin } => crate::tasks::paths::run(&config, &plugin),
        crate::cli::Cmd::Env { shell } => crate::tasks::env::run(&config, shell),
        crate::cli::Cmd::Doctor => crate::tasks::doctor::run(&config),
    }
}
