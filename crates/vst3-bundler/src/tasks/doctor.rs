use anyhow::{bail, Result};
use std::ffi::OsStr;

use vst3_bundler::toolchain::ToolchainEnv;
use vst3_bundler::{CommandRunner, Config, SystemRunner};

pub fn run(config: &Config) -> Result<()> {
    let toolchain = &config.toolchain;
    let mut ok = true;

    let mut search = ToolchainEnv::default();
    if let Some(dir) = toolchain.cargo_bin_dir() {
        search.prepend_path(dir);
    }
    match SystemRunner.locate(OsStr::new(&toolchain.cargo), &search.search_path()) {
        Some(path) => eprintln!("[OK] {} ({})", toolchain.cargo, path.display()),
        None => {
            eprintln!("[FAIL] missing `{}` in PATH and cargo bin dir", toolchain.cargo);
            ok = false;
        }
    }

    match &toolchain.env_script {
        Some(script) if script.is_file() => eprintln!("[OK] {}", script.display()),
        Some(script) => {
            eprintln!("[FAIL] missing compiler environment script: {}", script.display());
            ok = false;
        }
        None => eprintln!("[OK] no compiler environment script configured"),
    }

    for entry in &config.plugins {
        match config.resolve(entry, &Default::default()) {
            Ok(plugin) if plugin.source_root.join("Cargo.toml").is_file() => {
                eprintln!("[OK] {} ({})", entry.plugin_name, plugin.source_root.display());
            }
            Ok(plugin) => {
                eprintln!(
                    "[FAIL] {}: no Cargo.toml in {}",
                    entry.plugin_name,
                    plugin.source_root.display()
                );
                ok = false;
            }
            Err(e) => {
                eprintln!("[FAIL] {}: {e}", entry.plugin_name);
                ok = false;
            }
        }
    }

    if !ok {
        bail!("doctor checks failed");
    }
    Ok(())
}
