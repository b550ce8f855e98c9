//! `.c2s` chart headers.
//!
//! A chart is a tab-separated text file. We only read the two-column header lines
//! (`KEY\tVALUE`) carrying the designer and the judge counts; note lines have more columns
//! and are ignored. The file stem is `<song>_<chart>`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::{Error, Result};

/// Songs with ids from here up are single-chart (World's End) songs.
const WORLDS_END_SONG_ID: u32 = 8000;
const WORLDS_END_CHART_ID: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub song_id: u32,
    pub chart_id: u32,
    pub chart_designer: String,
    pub tap_judge_count: u32,
    pub hold_judge_count: u32,
    pub slide_judge_count: u32,
    pub air_judge_count: u32,
    pub flick_judge_count: u32,
    pub all_judge_count: u32,
}

/// A chart whose header lacked some fields. The row is still exported with defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFieldWarning {
    pub path: PathBuf,
    pub fields: Vec<&'static str>,
}

/// Read and parse the chart at `path`, logging a warning for missing header fields.
pub fn read_chart(path: &Path) -> Result<(ChartRow, Option<MissingFieldWarning>)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::parse(context(path), "chart file has no usable name"))?;
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let (row, missing) = parse_chart(stem, &text).map_err(|err| match err {
        Error::StructuralParse { message, .. } => Error::parse(context(path), message),
        other => other,
    })?;

    if missing.is_empty() {
        return Ok((row, None));
    }
    warn!(path = %path.display(), missing = ?missing, "chart file missing data");
    Ok((
        row,
        Some(MissingFieldWarning {
            path: path.to_path_buf(),
            fields: missing,
        }),
    ))
}

/// Parse a chart given its file stem and contents. Returns the row and the header keys
/// that were absent (or, for counts, not a number).
pub fn parse_chart(stem: &str, text: &str) -> Result<(ChartRow, Vec<&'static str>)> {
    let (song_id, mut chart_id) = match stem.split('_').collect::<Vec<_>>()[..] {
        [song, chart] => (
            song.parse::<u32>().map_err(|_| bad_stem(stem))?,
            chart.parse::<u32>().map_err(|_| bad_stem(stem))?,
        ),
        _ => return Err(bad_stem(stem)),
    };
    if song_id >= WORLDS_END_SONG_ID {
        chart_id = WORLDS_END_CHART_ID;
    }

    let header: Vec<(&str, &str)> = text
        .lines()
        .filter_map(|line| match line.trim().split('\t').collect::<Vec<_>>()[..] {
            [key, value] => Some((key, value)),
            _ => None,
        })
        .collect();
    // Later lines win, as they would in a map.
    let lookup = |key: &str| {
        header
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    };

    let mut missing = Vec::new();
    let chart_designer = match lookup("CREATOR") {
        Some(designer) => designer.to_owned(),
        None => {
            missing.push("CREATOR");
            String::new()
        }
    };
    let mut count = |key: &'static str| match lookup(key).and_then(|v| v.parse().ok()) {
        Some(n) => n,
        None => {
            missing.push(key);
            0
        }
    };

    let row = ChartRow {
        song_id,
        chart_id,
        chart_designer,
        tap_judge_count: count("T_JUDGE_TAP"),
        hold_judge_count: count("T_JUDGE_HLD"),
        slide_judge_count: count("T_JUDGE_SLD"),
        air_judge_count: count("T_JUDGE_AIR"),
        flick_judge_count: count("T_JUDGE_FLK"),
        all_judge_count: count("T_JUDGE_ALL"),
    };
    Ok((row, missing))
}

fn bad_stem(stem: &str) -> Error {
    Error::parse(
        "chart file name",
        format!("expected <song>_<chart>, got {stem:?}"),
    )
}

fn context(path: &Path) -> String {
    format!("chart {}", path.display())
}
