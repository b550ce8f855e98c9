//! CHUNITHM.
//!
//! Assets live under `<data>/A000/<folder>/<item>/` for the base game and
//! `<opt>/Axxx/<folder>/<item>/` for each option pack.

use std::collections::HashSet;
use std::io::Write;
use std::iter;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::acb::Acb;
use crate::category::Category;
use crate::discover;
use crate::job::{Job, Source};
use crate::metadata::xml::{self, Fields};
use crate::metadata::{DocumentWriter, ExportSummary, StaticItem, SystemVoiceItem, Trophy, chart};
use crate::tools::OutputSpec;
use crate::{Error, Result};

use super::{ExtractPlan, JobIter, TitleDirs};

/// `(source folder, output folder)` for plain DDS images.
const IMAGE_FOLDERS: [(&str, &str); 5] = [
    ("avatarAccessory", "avatar"),
    ("ddsImage", "character"),
    ("mapIcon", "map-icon"),
    ("namePlate", "name-plate"),
    ("systemVoice", "system-voice-icon"),
];

/// Loose textures under `<data>/surfboard/texture`, with their output folders.
const TEXTURES: [(&str, &str); 2] = [
    ("CHU_UI_Common_Avatar_body_00.dds", "avatar"),
    ("CHU_UI_title_rank_00_v10.dds", "trophy"),
];

/// Files matching `<data>/A000/<folder>/*/<name>` then `<opt>/*/<folder>/*/<name>`.
fn game_files(dirs: &TitleDirs, folder: &str, name: &str) -> impl Iterator<Item = PathBuf> + use<> {
    discover::find(&dirs.data_dir, &format!("A000/{folder}/*/{name}"))
        .chain(discover::find(&dirs.opt_dir, &format!("*/{folder}/*/{name}")))
}

/// Every job for the categories `plan` enables: jackets, images, music, then audio.
pub fn jobs<'a>(dirs: &'a TitleDirs, plan: &'a ExtractPlan) -> JobIter<'a> {
    let categories = Category::ALL
        .into_iter()
        .filter_map(move |category| plan.spec(category).map(|spec| (category, spec)));

    // Each category's walk starts only when the previous one is exhausted.
    Box::new(categories.flat_map(move |(category, spec)| -> JobIter<'a> {
        match category {
            Category::Jackets => Box::new(jackets(dirs, plan, spec)),
            Category::Images => Box::new(images(dirs, plan, spec)),
            Category::Music => Box::new(music(dirs, plan, spec)),
            Category::Audio => audio(dirs, plan, spec),
        }
    }))
}

fn jackets<'a>(
    dirs: &TitleDirs,
    plan: &'a ExtractPlan,
    spec: &'a OutputSpec,
) -> impl Iterator<Item = Result<Job>> + 'a {
    game_files(dirs, "music", "*.dds").map(move |path| {
        let base = plan.out_dir.join("jacket").join(file_name(&path));
        Ok(Job::new(Category::Jackets, Source::Image(path), &base, spec.clone()))
    })
}

fn images<'a>(
    dirs: &'a TitleDirs,
    plan: &'a ExtractPlan,
    spec: &'a OutputSpec,
) -> impl Iterator<Item = Result<Job>> + 'a {
    let folders = IMAGE_FOLDERS.into_iter().flat_map(move |(folder, out_folder)| {
        game_files(dirs, folder, "*.dds").map(move |path| (path, out_folder))
    });
    let texture_dir = dirs.data_dir.join("surfboard").join("texture");
    let textures = TEXTURES
        .into_iter()
        .map(move |(name, out_folder)| (texture_dir.join(name), out_folder));

    folders.chain(textures).map(move |(path, out_folder)| {
        let base = plan.out_dir.join(out_folder).join(file_name(&path));
        Ok(Job::new(Category::Images, Source::Image(path), &base, spec.clone()))
    })
}

fn music<'a>(
    dirs: &TitleDirs,
    plan: &'a ExtractPlan,
    spec: &'a OutputSpec,
) -> impl Iterator<Item = Result<Job>> + 'a {
    game_files(dirs, "cueFile", "music*.awb").map(move |path| {
        let base = plan.out_dir.join("music").join(file_name(&path));
        Ok(Job::new(Category::Music, Source::BankFirstStream(path), &base, spec.clone()))
    })
}

fn audio<'a>(dirs: &TitleDirs, plan: &'a ExtractPlan, spec: &'a OutputSpec) -> JobIter<'a> {
    Box::new(
        game_files(dirs, "cueFile", "systemvoice*.acb")
            .flat_map(move |path| -> JobIter<'a> {
                match voice_jobs(&path, plan, spec) {
                    Ok(jobs) => Box::new(jobs.into_iter().map(Ok)),
                    Err(err) => Box::new(iter::once(Err(err))),
                }
            }),
    )
}

/// One job per stream of the cue sheet at `path`, named after its cue.
///
/// The whole sheet is parsed and resolved before any job is emitted.
fn voice_jobs(path: &Path, plan: &ExtractPlan, spec: &OutputSpec) -> Result<Vec<Job>> {
    let acb = Acb::open(path)?;
    let names = acb.names()?;
    let port_names = names.get(&plan.awb_port);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (_, bank) = acb.into_parts();

    let mut taken = HashSet::new();
    let jobs = bank
        .into_streams()
        .map(|(id, data)| {
            let mut name = match port_names.and_then(|streams| streams.get(&id)) {
                Some(assigned) if assigned.ordinal == 0 => sanitize(&assigned.name),
                Some(assigned) => format!("{}_{}", sanitize(&assigned.name), assigned.ordinal),
                None => {
                    warn!(
                        acb = %path.display(),
                        stream = id,
                        "no cue name for stream; using its id"
                    );
                    id.to_string()
                }
            };
            // First stream in bank order keeps a contested name.
            while !taken.insert(name.clone()) {
                warn!(
                    acb = %path.display(),
                    stream = id,
                    name = %name,
                    "duplicate output name; appending stream id"
                );
                name = format!("{name}_{id}");
            }
            let base = plan.out_dir.join("system-voice").join(format!("{stem}_{name}"));
            let source = Source::Stream {
                bank: path.to_path_buf(),
                id,
                data,
            };
            Job::new(Category::Audio, source, &base, spec.clone())
        })
        .collect();
    Ok(jobs)
}

fn file_name(path: &Path) -> &std::ffi::OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}

/// Cue names become file names; keep them inside their folder.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

fn static_item(f: &Fields<'_, '_>) -> Result<StaticItem> {
    Ok(StaticItem {
        id: f.int("./name/id")?,
        name: f.text("./name/str")?,
        sort_name: f.text("./sortName")?,
        image_path: f.text("./image/path")?,
    })
}

fn read_items<T>(
    dirs: &TitleDirs,
    folder: &str,
    file: &str,
    read: fn(&Fields<'_, '_>) -> Result<T>,
) -> impl Iterator<Item = Result<T>> + use<T> {
    game_files(dirs, folder, file).map(move |path| {
        info!(path = %path.display(), "reading metadata");
        xml::read_file(&path, read)
    })
}

/// Write the chuni metadata document: map icons, name plates, system voices, trophies and
/// chart headers.
pub fn export(dirs: &TitleDirs, w: &mut dyn Write) -> Result<ExportSummary> {
    let mut doc = DocumentWriter::new(w);
    let mut summary = ExportSummary::default();

    let rows = doc.table("mapIcon", read_items(dirs, "mapIcon", "MapIcon.xml", static_item))?;
    summary.tables.push(("mapIcon", rows));

    let rows = doc.table(
        "namePlate",
        read_items(dirs, "namePlate", "NamePlate.xml", static_item),
    )?;
    summary.tables.push(("namePlate", rows));

    let rows = doc.table(
        "systemVoice",
        read_items(dirs, "systemVoice", "SystemVoice.xml", |f| {
            Ok(SystemVoiceItem {
                item: static_item(f)?,
                cue_path: f.text("./cue/str")?,
            })
        }),
    )?;
    summary.tables.push(("systemVoice", rows));

    let rows = doc.table(
        "trophy",
        read_items(dirs, "trophy", "Trophy.xml", |f| {
            Ok(Trophy {
                id: f.int("./name/id")?,
                name: f.text("./name/str")?,
                rare_type: f.int("./rareType")?,
                explain_text: f.text("./explainText")?,
            })
        }),
    )?;
    summary.tables.push(("trophy", rows));

    let mut warnings = Vec::new();
    let charts = game_files(dirs, "music", "*.c2s").map(|path| {
        info!(path = %path.display(), "reading chart");
        let (row, warning) = chart::read_chart(&path)?;
        warnings.extend(warning);
        Ok::<_, Error>(row)
    });
    let rows = doc.table("chart", charts)?;
    summary.tables.push(("chart", rows));
    summary.warnings = warnings;

    doc.close()?;
    Ok(summary)
}
