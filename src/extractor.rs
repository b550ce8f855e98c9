//! High-level API for running an extraction.
//!
//! `Extractor` wires the pieces together for one title:
//! enumerate jobs → schedule them over the tool adapter → tear down the scratch directory.
//!
//! The lower-level pieces (container readers, resolver, scheduler, tools) stay testable in
//! their own modules.

use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::Result;
use crate::config::Config;
use crate::job::Job;
use crate::opts::ExtractOpts;
use crate::scheduler::{self, RunSummary};
use crate::scratch::ScratchDir;
use crate::titles::{ExtractPlan, Title, TitleDirs};
use crate::tools::Toolchain;

/// The main extraction entry point.
///
/// Holds the asset configuration; each `run` gets its own scratch space and run id.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: Config,
}

impl Extractor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract every enabled category of `title`.
    pub fn run(&self, title: Title, dirs: &TitleDirs, opts: &ExtractOpts) -> Result<RunSummary> {
        self.run_with(title, dirs, opts, |_| {})
    }

    /// Like `run`, calling `on_done` (from a worker thread) after each job that succeeds.
    pub fn run_with<F>(
        &self,
        title: Title,
        dirs: &TitleDirs,
        opts: &ExtractOpts,
        on_done: F,
    ) -> Result<RunSummary>
    where
        F: Fn(&Job) + Sync,
    {
        let span = info_span!("extract", run_id = %Uuid::new_v4(), title = title.name());
        let _enter = span.enter();

        info!(
            out_dir = %opts.out_dir.display(),
            concurrency = opts.concurrency,
            overwrite = opts.overwrite,
            "starting extraction"
        );

        let scratch = ScratchDir::new(opts.scratch_dir());
        let tools = Toolchain::from_config(&self.config, scratch.clone());
        let plan = ExtractPlan::new(&self.config, title, &opts.out_dir, opts.overwrite);

        let run_res = scheduler::run(title.jobs(dirs, &plan), opts.concurrency, |job: &Job| {
            // Workers don't inherit the dispatcher's span.
            let _enter = span.enter();
            job.run(&tools)?;
            on_done(job);
            Ok(())
        });

        merge_run_and_cleanup(run_res, scratch.remove())
    }
}

/// The run's error wins; a cleanup failure alone still fails the run.
fn merge_run_and_cleanup(
    run_res: Result<RunSummary>,
    cleanup_res: Result<()>,
) -> Result<RunSummary> {
    match (run_res, cleanup_res) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            warn!(error = %cleanup_err, "failed to remove scratch directory");
            Err(err)
        }
    }
}
