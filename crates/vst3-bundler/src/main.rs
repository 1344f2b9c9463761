use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod tasks;

fn main() -> Result<()> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);
    crate::app::run(cli)
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "vst3_bundler=debug"
    } else {
        "vst3_bundler=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
