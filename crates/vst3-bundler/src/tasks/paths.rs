use anyhow::Result;

use vst3_bundler::Config;

use crate::cli::PluginArgs;

pub fn run(config: &Config, args: &PluginArgs) -> Result<()> {
    let layout = super::resolve_one(config, args)?.layout();

    println!("compiled {}", layout.compiled_binary.display());
    println!("bundle   {}", layout.bundle_dir.display());
    println!("binary   {}", layout.binary_path.display());
    Ok(())
}
