//! Extraction jobs.
//!
//! A `Job` is a plain value: owned paths and bytes, no handles. The enumerator builds them on
//! the dispatching thread and the scheduler moves them into workers, which call `run`.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::afs2::Afs2Bank;
use crate::category::Category;
use crate::tools::{InputArg, MediaRef, OutputSpec, Toolchain};
use crate::{Error, Result};

/// Where a job's media comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// An image ffmpeg can read directly (DDS textures).
    Image(PathBuf),

    /// The first stream of an audio bank on disk.
    BankFirstStream(PathBuf),

    /// One sub-stream already pulled out of a bank.
    Stream {
        bank: PathBuf,
        id: u64,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub category: Category,
    pub source: Source,
    /// Final output path, extension included.
    pub output: PathBuf,
    pub spec: OutputSpec,
}

impl Job {
    /// Build a job writing `base` with the extension from `spec`.
    pub fn new(category: Category, source: Source, base: &Path, spec: OutputSpec) -> Self {
        Self {
            category,
            source,
            output: spec.output_path(base),
            spec,
        }
    }

    /// Convert the source and write `self.output`.
    pub fn run(&self, tools: &Toolchain) -> Result<()> {
        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        match &self.source {
            Source::Image(path) => {
                tools.transcode(
                    vec![InputArg::flag("-i"), InputArg::path(path)],
                    &self.spec,
                    &self.output,
                )?;
            }
            Source::BankFirstStream(path) => {
                let bank = Afs2Bank::open(path)?;
                let first = bank.entries().first().ok_or_else(|| {
                    Error::parse(
                        format!("AFS2 bank {}", path.display()),
                        "bank has no streams",
                    )
                })?;
                let pcm = tools.decode_to_pcm(MediaRef::Bytes(bank.stream(first)))?;
                tools.transcode(
                    vec![InputArg::flag("-i"), InputArg::bytes(pcm)],
                    &self.spec,
                    &self.output,
                )?;
            }
            Source::Stream { data, .. } => {
                let pcm = tools.decode_to_pcm(MediaRef::Bytes(data))?;
                tools.transcode(
                    vec![InputArg::flag("-i"), InputArg::bytes(pcm)],
                    &self.spec,
                    &self.output,
                )?;
            }
        }

        info!(category = %self.category, output = %self.output.display(), "wrote asset");
        Ok(())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Image(path) | Source::BankFirstStream(path) => write!(
                f,
                "{} job {} -> {}",
                self.category,
                path.display(),
                self.output.display()
            ),
            Source::Stream { bank, id, .. } => write!(
                f,
                "{} job {}#{} -> {}",
                self.category,
                bank.display(),
                id,
                self.output.display()
            ),
        }
    }
}
