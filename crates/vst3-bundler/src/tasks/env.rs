use anyhow::{Context, Result};

use vst3_bundler::toolchain::{self, Shell};
use vst3_bundler::{Config, SystemRunner};

pub fn run(config: &Config, shell: Shell) -> Result<()> {
    let env = toolchain::prepare(&config.toolchain, &SystemRunner)
        .context("Preparing the toolchain environment")?;

    // Pure exports so users can `eval` the output.
    print!("{}", env.render_exports(shell));
    Ok(())
}
