//! Supported titles.
//!
//! Each title knows where its assets live, how to turn them into jobs, and how to export its
//! static metadata. The set is closed: adding a title means adding a module and a row to
//! `Title::entry`.

pub mod chuni;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::category::Category;
use crate::config::Config;
use crate::job::Job;
use crate::metadata::ExportSummary;
use crate::tools::OutputSpec;
use crate::{Error, Result};

/// Lazy, restartable job sequence.
pub type JobIter<'a> = Box<dyn Iterator<Item = Result<Job>> + 'a>;

/// Install directories for one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleDirs {
    /// Contains `A000`.
    pub data_dir: PathBuf,
    /// Contains `A001`, `A002`, ...
    pub opt_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Title {
    Chuni,
}

struct TitleEntry {
    name: &'static str,
    /// Bank port whose streams the audio category names.
    awb_port: u64,
    jobs: for<'a> fn(&'a TitleDirs, &'a ExtractPlan) -> JobIter<'a>,
    export: fn(&TitleDirs, &mut dyn Write) -> Result<ExportSummary>,
}

static CHUNI: TitleEntry = TitleEntry {
    name: "chuni",
    awb_port: 0,
    jobs: chuni::jobs,
    export: chuni::export,
};

impl Title {
    pub const ALL: [Title; 1] = [Title::Chuni];

    fn entry(self) -> &'static TitleEntry {
        match self {
            Title::Chuni => &CHUNI,
        }
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Jobs for every enabled category, in category order.
    ///
    /// When `plan` forbids overwriting, jobs whose output already exists are skipped here.
    pub fn jobs<'a>(self, dirs: &'a TitleDirs, plan: &'a ExtractPlan) -> JobIter<'a> {
        let jobs = (self.entry().jobs)(dirs, plan);
        if plan.overwrite {
            return jobs;
        }
        Box::new(jobs.filter(|item| match item {
            Ok(job) if job.output.exists() => {
                debug!(output = %job.output.display(), "output exists; skipping");
                false
            }
            _ => true,
        }))
    }

    /// Write this title's metadata document as JSON.
    pub fn export(self, dirs: &TitleDirs, w: &mut dyn Write) -> Result<ExportSummary> {
        (self.entry().export)(dirs, w)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Title {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Title::ALL
            .into_iter()
            .find(|title| title.name() == s)
            .ok_or_else(|| Error::Usage(format!("unknown title `{s}`")))
    }
}

/// Everything an enumerator needs to know about the outputs it should produce.
#[derive(Debug, Clone)]
pub struct ExtractPlan {
    /// `<out>/<title>`.
    pub out_dir: PathBuf,
    pub overwrite: bool,
    pub awb_port: u64,
    specs: Vec<(Category, OutputSpec)>,
}

impl ExtractPlan {
    pub fn new(config: &Config, title: Title, out_root: &Path, overwrite: bool) -> Self {
        let specs = Category::ALL
            .into_iter()
            .filter(|c| config.is_enabled(*c))
            .map(|c| (c, OutputSpec::for_category(config, c)))
            .collect();

        Self {
            out_dir: out_root.join(title.name()),
            overwrite,
            awb_port: title.entry().awb_port,
            specs,
        }
    }

    /// Output settings for `category`, or `None` when it is disabled.
    pub fn spec(&self, category: Category) -> Option<&OutputSpec> {
        self.specs
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, spec)| spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
vgmstream_path: vgmstream-cli
ffmpeg_path: ffmpeg
music: { enable: true, extension: .opus }
jackets: { enable: false, extension: .webp }
images: { enable: true, extension: webp, ffmpeg_args: ["-q:v", "90"] }
audio: { enable: true, extension: .opus }
"#;

    #[test]
    fn titles_parse_by_name() -> anyhow::Result<()> {
        assert_eq!("chuni".parse::<Title>()?, Title::Chuni);
        assert!(matches!("ongeki".parse::<Title>(), Err(Error::Usage(_))));
        assert_eq!(Title::Chuni.to_string(), "chuni");
        Ok(())
    }

    #[test]
    fn plan_roots_outputs_per_title_and_skips_disabled() -> anyhow::Result<()> {
        let config = Config::from_yaml(YAML)?;
        let plan = ExtractPlan::new(&config, Title::Chuni, Path::new("out"), true);

        assert_eq!(plan.out_dir, PathBuf::from("out/chuni"));
        assert!(plan.spec(Category::Jackets).is_none());

        let images = plan.spec(Category::Images).unwrap();
        assert_eq!(images.extension, ".webp");
        assert_eq!(images.extra_args, vec!["-q:v", "90"]);
        Ok(())
    }
}
