// Export a title's static metadata (items, trophies, chart headers) as a JSON document.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use assetpipe::logging;
use assetpipe::titles::{Title, TitleDirs};

#[derive(Parser, Debug)]
#[command(name = "meta-export")]
#[command(about = "Export static game metadata as JSON", long_about = None)]
struct Args {
    /// Write the document here instead of stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    title: TitleCommand,
}

#[derive(Subcommand, Debug)]
enum TitleCommand {
    /// CHUNITHM.
    Chuni {
        /// Data directory (containing A000).
        #[arg(long)]
        data_dir: PathBuf,

        /// Option directory (containing A001, etc.).
        #[arg(long)]
        opt_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let (title, dirs) = match args.title {
        TitleCommand::Chuni { data_dir, opt_dir } => {
            (Title::Chuni, TitleDirs { data_dir, opt_dir })
        }
    };

    let mut writer: BufWriter<Box<dyn Write>> = match &args.output {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => BufWriter::new(Box::new(io::stdout().lock())),
    };

    let summary = title
        .export(&dirs, &mut writer)
        .with_context(|| format!("failed to export {title} metadata"))?;
    writer.flush()?;

    for (table, rows) in &summary.tables {
        info!(table, rows, "exported table");
    }
    if !summary.warnings.is_empty() {
        info!(charts = summary.warnings.len(), "some charts were missing header fields");
    }
    Ok(())
}
