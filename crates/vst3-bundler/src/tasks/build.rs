use anyhow::Result;

use vst3_bundler::{pipeline, Config, Pipeline, SystemRunner};

use crate::cli::PluginArgs;

pub fn run(config: &Config, args: &PluginArgs, all: bool, no_helper: bool) -> Result<()> {
    let jobs = if all {
        super::resolve_all(config, args)?
    } else {
        vec![super::resolve_one(config, args)?]
    };

    for job in jobs {
        eprintln!(
            "[step] Build + bundle: {} -> {}.vst3 [{}]",
            job.plugin.plugin_name,
            job.plugin.bundle_name,
            job.target
        );
        eprintln!("[info] Source root: {}", job.source_root.display());

        let report = Pipeline::new(job, SystemRunner)
            .skip_helper(no_helper)
            .run();
        // The first abort ends the batch.
        super::finish(report)?;
    }
    Ok(())
}

pub fn bundle_only(config: &Config, args: &PluginArgs) -> Result<()> {
    let job = super::resolve_one(config, args)?;
    eprintln!(
        "[step] Manual bundle: {} -> {}.vst3",
        job.plugin.binary_name, job.plugin.bundle_name
    );
    super::finish(pipeline::bundle_only(&job))
}
