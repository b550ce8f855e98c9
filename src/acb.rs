//! ACB cue sheets: a one-row `@UTF` table whose data columns hold nested tables and,
//! optionally, an embedded AFS2 bank.
//!
//! We only read what name resolution and stream extraction need:
//! - `CueNameTable` (`CueName`, `CueIndex`)
//! - `SequenceTable` (`NumTracks`, `TrackIndex`)
//! - `SynthTable` (`ReferenceItems`)
//! - `WaveformTable` (`StreamAwbPortNo`, `StreamAwbId`)
//! - `AwbFile`, falling back to a sibling `<stem>.awb` when the bank is streamed

use std::path::{Path, PathBuf};

use crate::afs2::Afs2Bank;
use crate::resolver::{self, CueName, CueTables, NameAssignment, Sequence, Synth, Waveform};
use crate::utf_table::UtfTable;
use crate::{Error, Result};

/// A parsed cue sheet together with the bank its waveforms live in.
#[derive(Debug, Clone)]
pub struct Acb {
    tables: CueTables,
    bank: Afs2Bank,
}

impl Acb {
    /// Read an `.acb` file and its bank.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&bytes, path).map_err(|err| in_file(err, path))
    }

    /// Parse cue sheet bytes. `path` locates a streamed bank next to the sheet.
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        let header = UtfTable::parse(bytes)?;
        let tables = read_cue_tables(&header)?;

        let embedded: &[u8] = if header.has_column("AwbFile") {
            header.data(0, "AwbFile")?
        } else {
            &[]
        };
        let bank = if embedded.is_empty() {
            Afs2Bank::open(streamed_bank_path(path))?
        } else {
            Afs2Bank::parse(embedded.to_vec())?
        };

        Ok(Self { tables, bank })
    }

    pub fn cue_tables(&self) -> &CueTables {
        &self.tables
    }

    pub fn bank(&self) -> &Afs2Bank {
        &self.bank
    }

    /// Resolve display names for every stream in the bank.
    pub fn names(&self) -> Result<NameAssignment> {
        resolver::resolve(&self.tables)
    }

    pub fn into_parts(self) -> (CueTables, Afs2Bank) {
        (self.tables, self.bank)
    }
}

/// `<dir>/<stem>.awb` for a cue sheet at `<dir>/<stem>.acb`.
pub fn streamed_bank_path(acb_path: &Path) -> PathBuf {
    acb_path.with_extension("awb")
}

/// Extract the four resolution tables from an ACB header table.
pub fn read_cue_tables(header: &UtfTable) -> Result<CueTables> {
    let cue_table = header.table(0, "CueNameTable")?;
    let cue_names = (0..cue_table.row_count())
        .map(|row| {
            Ok(CueName {
                name: cue_table.string(row, "CueName")?.to_owned(),
                cue_index: cue_table.u64(row, "CueIndex")? as usize,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let sequence_table = header.table(0, "SequenceTable")?;
    let sequences = (0..sequence_table.row_count())
        .map(|row| {
            Ok(Sequence {
                declared_tracks: sequence_table.u64(row, "NumTracks")? as usize,
                track_indexes: decode_track_indexes(sequence_table.data(row, "TrackIndex")?)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let synth_table = header.table(0, "SynthTable")?;
    let synths = (0..synth_table.row_count())
        .map(|row| {
            Ok(Synth {
                reference_items: synth_table.data(row, "ReferenceItems")?.to_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Older sheets carry a single `Id` column instead of the port/stream pair.
    let waveform_table = header.table(0, "WaveformTable")?;
    let id_column = if waveform_table.has_column("StreamAwbId") {
        "StreamAwbId"
    } else {
        "Id"
    };
    let has_port = waveform_table.has_column("StreamAwbPortNo");
    let waveforms = (0..waveform_table.row_count())
        .map(|row| {
            Ok(Waveform {
                awb_port: if has_port {
                    waveform_table.u64(row, "StreamAwbPortNo")?
                } else {
                    0
                },
                awb_stream_id: waveform_table.u64(row, id_column)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CueTables {
        cue_names,
        sequences,
        synths,
        waveforms,
    })
}

/// `TrackIndex` is a packed list of big-endian u16 track indexes.
pub fn decode_track_indexes(blob: &[u8]) -> Result<Vec<usize>> {
    if blob.len() % 2 != 0 {
        return Err(Error::parse(
            "sequence track index",
            format!("odd blob length {}", blob.len()),
        ));
    }
    Ok(blob
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as usize)
        .collect())
}

fn in_file(err: Error, path: &Path) -> Error {
    match err {
        Error::StructuralParse { context, message } => Error::StructuralParse {
            context: format!("{context} in {}", path.display()),
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_indexes_are_big_endian_pairs() -> anyhow::Result<()> {
        assert_eq!(decode_track_indexes(&[0, 3, 0, 5, 1, 0])?, vec![3, 5, 256]);
        assert!(decode_track_indexes(&[])?.is_empty());
        Ok(())
    }

    #[test]
    fn odd_track_index_blob_is_structural() {
        assert!(decode_track_indexes(&[0, 1, 2]).unwrap_err().is_structural());
    }

    #[test]
    fn streamed_bank_sits_next_to_the_sheet() {
        assert_eq!(
            streamed_bank_path(Path::new("cue/systemvoice0001.acb")),
            PathBuf::from("cue/systemvoice0001.awb")
        );
    }
}
