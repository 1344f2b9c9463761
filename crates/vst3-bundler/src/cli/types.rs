use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use vst3_bundler::toolchain::Shell;
use vst3_bundler::{Overrides, Profile};

#[derive(Parser)]
#[command(name = "vst3-bundler", version)]
#[command(about = "Build nih-plug style plugins and assemble their VST3 bundles")]
pub struct Cli {
    /// Log every stage and external command.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./vst3-bundler.json when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Compile, then bundle with the packaging helper.
    ///
    /// If the helper fails, the bundle directory is assembled by hand.
    Build {
        #[command(flatten)]
        plugin: PluginArgs,

        #[arg(
            long,
            conflicts_with_all = ["plugin", "bundle_name", "binary_name", "source_root"],
            help = "Build every plugin listed in the config file, one after another."
        )]
        all: bool,

        #[arg(
            long = "no-helper",
            help = "Skip the packaging helper and assemble the bundle by hand."
        )]
        no_helper: bool,
    },

    /// Assemble the bundle by hand from an already compiled binary.
    Bundle {
        #[command(flatten)]
        plugin: PluginArgs,
    },

    /// Print where the compiled binary and the bundle live.
    Paths {
        #[command(flatten)]
        plugin: PluginArgs,
    },

    /// Print the scoped toolchain environment as shell exports.
    ///
    /// Usage:
    ///   eval "$(vst3-bundler env bash)"
    Env {
        #[arg(value_enum, default_value_t = Shell::Bash)]
        shell: Shell,
    },

    /// Check that cargo, the compiler environment script and the plugin
    /// source roots are in place.
    Doctor,
}

#[derive(Args, Clone, Debug, Default)]
pub struct PluginArgs {
    /// Cargo package name of the plugin (optional when the config lists exactly one).
    pub plugin: Option<String>,

    /// Bundle name without `.vst3` (default: plugin name in PascalCase).
    #[arg(long, value_name = "NAME")]
    pub bundle_name: Option<String>,

    /// File name cargo writes for the plugin (default: derived from the plugin name).
    #[arg(long, value_name = "FILE")]
    pub binary_name: Option<String>,

    /// Target triple (default: x86_64-pc-windows-msvc).
    #[arg(long = "target", value_name = "TRIPLE")]
    pub target_triple: Option<String>,

    #[arg(long, value_enum)]
    pub profile: Option<Profile>,

    /// Plugin crate root (default: from the config, else the current directory).
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,
}

impl PluginArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            bundle_name: self.bundle_name.clone(),
            binary_name: self.binary_name.clone(),
            target_triple: self.target_triple.clone(),
            profile: self.profile,
            source_root: self.source_root.clone(),
        }
    }
}
