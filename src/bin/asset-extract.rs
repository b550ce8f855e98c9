// Extract a title's images, jackets, music and system voices into web media.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use assetpipe::category::Category;
use assetpipe::config::Config;
use assetpipe::extractor::Extractor;
use assetpipe::logging;
use assetpipe::opts::ExtractOpts;
use assetpipe::titles::{Title, TitleDirs};

#[derive(Parser, Debug)]
#[command(name = "asset-extract")]
#[command(about = "Extract game assets into web-friendly media", long_about = None)]
struct Args {
    /// Asset config.
    #[arg(long, default_value = "assets.yaml")]
    config: PathBuf,

    /// Number of jobs to run at once (default: one per CPU).
    #[arg(short = 'p', long)]
    processes: Option<usize>,

    /// Output directory.
    #[arg(
        short = 'o',
        long,
        visible_aliases = ["output-dir", "output"],
        default_value = "../public/assets"
    )]
    out_dir: PathBuf,

    /// Don't overwrite existing files.
    #[arg(short = 'n', long)]
    no_overwrite: bool,

    /// Don't process music files.
    #[arg(long)]
    no_music: bool,

    /// Don't process other audio files.
    #[arg(long)]
    no_audio: bool,

    /// Don't process jacket images.
    #[arg(long)]
    no_jackets: bool,

    /// Don't process other images.
    #[arg(long)]
    no_images: bool,

    #[command(subcommand)]
    title: TitleCommand,
}

#[derive(Subcommand, Debug)]
enum TitleCommand {
    /// CHUNITHM.
    Chuni(DirArgs),
}

#[derive(clap::Args, Debug)]
struct DirArgs {
    /// Data directory (containing A000).
    #[arg(long)]
    data_dir: PathBuf,

    /// Option directory (containing A001, etc.).
    #[arg(long)]
    opt_dir: PathBuf,
}

impl TitleCommand {
    fn into_parts(self) -> (Title, TitleDirs) {
        match self {
            TitleCommand::Chuni(dirs) => (
                Title::Chuni,
                TitleDirs {
                    data_dir: dirs.data_dir,
                    opt_dir: dirs.opt_dir,
                },
            ),
        }
    }
}

fn main() -> ExitCode {
    logging::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "extraction failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    for (off, category) in [
        (args.no_music, Category::Music),
        (args.no_audio, Category::Audio),
        (args.no_jackets, Category::Jackets),
        (args.no_images, Category::Images),
    ] {
        if off {
            config.disable(category);
        }
    }

    let mut opts = ExtractOpts::new(args.out_dir);
    if let Some(processes) = args.processes {
        opts.concurrency = processes;
    }
    opts.overwrite = !args.no_overwrite;

    let (title, dirs) = args.title.into_parts();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {pos} assets written [{elapsed_precise}] {msg}",
        )
        .context("invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = Extractor::new(config).run_with(title, &dirs, &opts, |job| {
        pb.inc(1);
        pb.set_message(job.output.display().to_string());
    });
    pb.finish_and_clear();

    let summary = result.with_context(|| format!("failed to extract {title} assets"))?;
    eprintln!("{title}: {} assets written", summary.completed);
    Ok(())
}
