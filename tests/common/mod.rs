#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// A `@UTF` column type we know how to write.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    U8,
    U16,
    U32,
    Str,
    Data,
}

impl Kind {
    fn code(self) -> u8 {
        match self {
            Kind::U8 => 0x00,
            Kind::U16 => 0x02,
            Kind::U32 => 0x04,
            Kind::Str => 0x0a,
            Kind::Data => 0x0b,
        }
    }

    fn width(self) -> usize {
        match self {
            Kind::U8 => 1,
            Kind::U16 => 2,
            Kind::U32 | Kind::Str => 4,
            Kind::Data => 8,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Cell {
    Int(u32),
    Str(String),
    Data(Vec<u8>),
}

/// Builds `@UTF` tables with every column stored per row.
#[derive(Debug, Clone)]
pub struct UtfWriter {
    name: String,
    columns: Vec<(String, Kind)>,
    rows: Vec<Vec<Cell>>,
}

impl UtfWriter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, name: &str, kind: Kind) -> Self {
        self.columns.push((name.to_owned(), kind));
        self
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        assert_eq!(cells.len(), self.columns.len(), "row width mismatch");
        self.rows.push(cells);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut strings = b"<NULL>\0".to_vec();
        let mut intern = |s: &str| {
            let at = strings.len() as u32;
            strings.extend_from_slice(s.as_bytes());
            strings.push(0);
            at
        };

        let name_at = intern(&self.name);
        let mut schema = Vec::new();
        for (name, kind) in &self.columns {
            schema.push(0x50 | kind.code());
            schema.extend_from_slice(&intern(name).to_be_bytes());
        }

        let mut data = Vec::new();
        let mut rows = Vec::new();
        for row in &self.rows {
            for ((_, kind), cell) in self.columns.iter().zip(row) {
                match (kind, cell) {
                    (Kind::U8, Cell::Int(v)) => rows.push(*v as u8),
                    (Kind::U16, Cell::Int(v)) => rows.extend_from_slice(&(*v as u16).to_be_bytes()),
                    (Kind::U32, Cell::Int(v)) => rows.extend_from_slice(&v.to_be_bytes()),
                    (Kind::Str, Cell::Str(s)) => rows.extend_from_slice(&intern(s).to_be_bytes()),
                    (Kind::Data, Cell::Data(d)) => {
                        rows.extend_from_slice(&(data.len() as u32).to_be_bytes());
                        rows.extend_from_slice(&(d.len() as u32).to_be_bytes());
                        data.extend_from_slice(d);
                    }
                    (kind, cell) => panic!("cell {cell:?} does not fit column type {kind:?}"),
                }
            }
        }

        let row_width: usize = self.columns.iter().map(|(_, k)| k.width()).sum();
        let rows_offset = 0x20 + schema.len();
        let strings_offset = rows_offset + rows.len();
        let data_offset = strings_offset + strings.len();
        let end = data_offset + data.len();

        let mut out = Vec::with_capacity(end);
        out.extend_from_slice(b"@UTF");
        out.extend_from_slice(&((end - 8) as u32).to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&((rows_offset - 8) as u16).to_be_bytes());
        out.extend_from_slice(&((strings_offset - 8) as u32).to_be_bytes());
        out.extend_from_slice(&((data_offset - 8) as u32).to_be_bytes());
        out.extend_from_slice(&name_at.to_be_bytes());
        out.extend_from_slice(&(self.columns.len() as u16).to_be_bytes());
        out.extend_from_slice(&(row_width as u16).to_be_bytes());
        out.extend_from_slice(&(self.rows.len() as u32).to_be_bytes());
        out.extend_from_slice(&schema);
        out.extend_from_slice(&rows);
        out.extend_from_slice(&strings);
        out.extend_from_slice(&data);
        out
    }
}

/// An AFS2 bank with 2-byte ids, 4-byte offsets and 32-byte alignment.
pub fn afs2_bank(streams: &[(u16, &[u8])]) -> Vec<u8> {
    const ALIGN: usize = 32;
    let count = streams.len();

    let mut out = Vec::new();
    out.extend_from_slice(b"AFS2");
    out.extend_from_slice(&[1, 4]);
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&(count as u32).to_le_bytes());
    out.extend_from_slice(&(ALIGN as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    for (id, _) in streams {
        out.extend_from_slice(&id.to_le_bytes());
    }

    let mut pos = out.len() + (count + 1) * 4;
    let mut offsets = Vec::new();
    let mut body = Vec::new();
    for (_, payload) in streams {
        offsets.push(pos as u32);
        let aligned = pos.div_ceil(ALIGN) * ALIGN;
        body.resize(body.len() + (aligned - pos), 0);
        body.extend_from_slice(payload);
        pos = aligned + payload.len();
    }
    offsets.push(pos as u32);

    for off in offsets {
        out.extend_from_slice(&off.to_le_bytes());
    }
    out.extend_from_slice(&body);
    out
}

/// One cue: a name and the waveform indexes its tracks play.
pub struct CueSpec<'a> {
    pub name: &'a str,
    pub waveforms: &'a [u16],
}

/// A cue sheet where cue `i` owns sequence `i`, every track gets its own synth, and waveform
/// `i` is stream `waveform_ids[i]` on port 0.
///
/// `bank` is embedded when given; otherwise the sheet expects a sibling `.awb`.
pub fn acb(cues: &[CueSpec<'_>], waveform_ids: &[u16], bank: Option<&[u8]>) -> Vec<u8> {
    let mut cue_names = UtfWriter::new("CueName")
        .column("CueName", Kind::Str)
        .column("CueIndex", Kind::U16);
    let mut sequences = UtfWriter::new("Sequence")
        .column("NumTracks", Kind::U16)
        .column("TrackIndex", Kind::Data);
    let mut synths = UtfWriter::new("Synth").column("ReferenceItems", Kind::Data);

    let mut next_synth = 0u16;
    for (i, cue) in cues.iter().enumerate() {
        cue_names = cue_names.row(vec![Cell::Str(cue.name.to_owned()), Cell::Int(i as u32)]);

        let mut track_index = Vec::new();
        for waveform in cue.waveforms {
            track_index.extend_from_slice(&next_synth.to_be_bytes());
            next_synth += 1;

            let mut items = vec![0x00, 0x01];
            items.extend_from_slice(&waveform.to_be_bytes());
            synths = synths.row(vec![Cell::Data(items)]);
        }
        sequences = sequences.row(vec![
            Cell::Int(cue.waveforms.len() as u32),
            Cell::Data(track_index),
        ]);
    }

    let mut waveforms = UtfWriter::new("Waveform")
        .column("StreamAwbPortNo", Kind::U16)
        .column("StreamAwbId", Kind::U16);
    for id in waveform_ids {
        waveforms = waveforms.row(vec![Cell::Int(0), Cell::Int(u32::from(*id))]);
    }

    UtfWriter::new("Header")
        .column("CueNameTable", Kind::Data)
        .column("SequenceTable", Kind::Data)
        .column("SynthTable", Kind::Data)
        .column("WaveformTable", Kind::Data)
        .column("AwbFile", Kind::Data)
        .row(vec![
            Cell::Data(cue_names.build()),
            Cell::Data(sequences.build()),
            Cell::Data(synths.build()),
            Cell::Data(waveforms.build()),
            Cell::Data(bank.map(<[u8]>::to_vec).unwrap_or_default()),
        ])
        .build()
}

/// Write `body` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, body: &[u8]) -> Result<PathBuf> {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("relative path has a parent"))?;
    fs::write(&path, body)?;
    Ok(path)
}

/// A canonical 16-bit mono PCM WAV of `frames` silent samples.
pub fn silent_wav(frames: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut cursor, spec)?;
        for _ in 0..frames {
            w.write_sample(0i16)?;
        }
        w.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// An executable shell script standing in for an external tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, script: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{script}\n"))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
