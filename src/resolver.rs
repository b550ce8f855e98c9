//! Cue name resolution for cue-indexed audio banks.
//!
//! Once a sub-stream has been pulled out of a bank, the only address it carries is its
//! `(awb port, stream id)` pair. Its human-readable name lives at the other end of a chain:
//!
//! ```text
//! cue name → sequence → track → synth reference → waveform → (port, stream id)
//! ```
//!
//! `resolve` walks that chain forward from every named cue and records the name under the
//! physical address. This module is pure: no I/O, no logging.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// One named cue (`CueNameTable` row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueName {
    pub name: String,
    pub cue_index: usize,
}

/// Track list of one cue (`SequenceTable` row).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    /// `NumTracks` as declared by the table.
    pub declared_tracks: usize,
    /// Decoded `TrackIndex` list.
    pub track_indexes: Vec<usize>,
}

impl Sequence {
    pub fn new(track_indexes: Vec<usize>) -> Self {
        Self {
            declared_tracks: track_indexes.len(),
            track_indexes,
        }
    }
}

/// One synth (`SynthTable` row), holding its raw `ReferenceItems` blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synth {
    pub reference_items: Vec<u8>,
}

/// Physical location of one waveform (`WaveformTable` row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waveform {
    pub awb_port: u64,
    pub awb_stream_id: u64,
}

/// The four tables `resolve` reads, in source order.
#[derive(Debug, Clone, Default)]
pub struct CueTables {
    pub cue_names: Vec<CueName>,
    pub sequences: Vec<Sequence>,
    pub synths: Vec<Synth>,
    pub waveforms: Vec<Waveform>,
}

/// Resolved name for one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedName {
    /// Position of the stream within its cue's track list.
    pub ordinal: usize,
    pub name: String,
}

impl AssignedName {
    pub fn new(ordinal: usize, name: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
        }
    }
}

/// `awb port → stream id → name`.
pub type NameAssignment = BTreeMap<u64, BTreeMap<u64, AssignedName>>;

/// Decode a synth's reference-items blob into a waveform index.
///
/// The blob is a two-byte type/flags prefix followed by a big-endian unsigned index of
/// whatever width remains (two bytes in practice).
pub fn decode_reference_items(items: &[u8]) -> Result<usize> {
    let index = match items {
        [_, _, rest @ ..] if !rest.is_empty() && rest.len() <= 8 => rest,
        _ => {
            return Err(Error::parse(
                "synth reference items",
                format!("expected 3..=10 bytes, got {}", items.len()),
            ));
        }
    };

    let value = index
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    usize::try_from(value)
        .map_err(|_| Error::parse("synth reference items", format!("index {value} overflows")))
}

/// Map every named cue's waveforms to `(ordinal, cue name)`, keyed by physical address.
///
/// - Cues whose sequence has no tracks are skipped.
/// - When two cues land on the same `(port, stream id)`, the later cue in `cue_names` wins.
/// - A sequence whose index list disagrees with its declared track count, or any index that
///   points outside its table, is a structural error.
pub fn resolve(tables: &CueTables) -> Result<NameAssignment> {
    let mut out = NameAssignment::new();

    for cue in &tables.cue_names {
        let sequence = lookup(&tables.sequences, cue.cue_index, "sequence", &cue.name)?;
        if sequence.declared_tracks == 0 {
            continue;
        }

        if sequence.track_indexes.len() != sequence.declared_tracks {
            return Err(Error::parse(
                format!("sequence {} (cue '{}')", cue.cue_index, cue.name),
                format!(
                    "declares {} tracks but lists {}",
                    sequence.declared_tracks,
                    sequence.track_indexes.len()
                ),
            ));
        }

        for (ordinal, &track_index) in sequence.track_indexes.iter().enumerate() {
            let synth = lookup(&tables.synths, track_index, "synth", &cue.name)?;
            let waveform_index = decode_reference_items(&synth.reference_items)?;
            let waveform = lookup(&tables.waveforms, waveform_index, "waveform", &cue.name)?;

            out.entry(waveform.awb_port)
                .or_default()
                .insert(waveform.awb_stream_id, AssignedName::new(ordinal, &cue.name));
        }
    }

    Ok(out)
}

fn lookup<'a, T>(table: &'a [T], index: usize, what: &str, cue: &str) -> Result<&'a T> {
    table.get(index).ok_or_else(|| {
        Error::parse(
            format!("{what} table"),
            format!(
                "cue '{cue}' references {what} {index}, table has {} rows",
                table.len()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth_to(waveform_index: u16) -> Synth {
        let mut reference_items = vec![0x00, 0x01];
        reference_items.extend_from_slice(&waveform_index.to_be_bytes());
        Synth { reference_items }
    }

    fn wave(port: u64, id: u64) -> Waveform {
        Waveform {
            awb_port: port,
            awb_stream_id: id,
        }
    }

    fn cue(name: &str, cue_index: usize) -> CueName {
        CueName {
            name: name.to_owned(),
            cue_index,
        }
    }

    /// Synth `i` points at waveform `i`; waveform `i` is stream `i` on port 0.
    fn identity_tables(n: usize) -> CueTables {
        CueTables {
            synths: (0..n as u16).map(synth_to).collect(),
            waveforms: (0..n as u64).map(|i| wave(0, i)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_the_result_scenario() -> anyhow::Result<()> {
        let mut synths: Vec<Synth> = (0..6).map(|_| synth_to(0)).collect();
        synths[3] = synth_to(10);
        synths[5] = synth_to(11);
        let mut waveforms = vec![wave(9, 9); 12];
        waveforms[10] = wave(0, 2);
        waveforms[11] = wave(0, 4);

        let tables = CueTables {
            cue_names: vec![cue("Result", 0)],
            sequences: vec![Sequence::new(vec![3, 5])],
            synths,
            waveforms,
        };

        let expected = NameAssignment::from([(
            0,
            BTreeMap::from([
                (2, AssignedName::new(0, "Result")),
                (4, AssignedName::new(1, "Result")),
            ]),
        )]);
        assert_eq!(resolve(&tables)?, expected);
        Ok(())
    }

    #[test]
    fn ordinals_follow_track_order() -> anyhow::Result<()> {
        let mut tables = identity_tables(8);
        tables.cue_names = vec![cue("Voice", 0)];
        tables.sequences = vec![Sequence::new(vec![6, 1, 4, 0, 7])];

        let names = resolve(&tables)?;
        let port0 = &names[&0];
        let ordinals: Vec<usize> = [6u64, 1, 4, 0, 7].iter().map(|id| port0[id].ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
        assert_eq!(port0.len(), 5);
        Ok(())
    }

    #[test]
    fn zero_track_sequences_are_skipped() -> anyhow::Result<()> {
        let mut tables = identity_tables(2);
        tables.cue_names = vec![cue("Silent", 0), cue("Loud", 1)];
        tables.sequences = vec![Sequence::new(vec![]), Sequence::new(vec![1])];

        let names = resolve(&tables)?;
        assert_eq!(names.len(), 1);
        assert_eq!(names[&0].len(), 1);
        assert_eq!(names[&0][&1], AssignedName::new(0, "Loud"));
        Ok(())
    }

    #[test]
    fn later_cue_wins_on_collision() -> anyhow::Result<()> {
        let mut tables = identity_tables(3);
        tables.cue_names = vec![cue("First", 0), cue("Second", 1)];
        tables.sequences = vec![Sequence::new(vec![0, 2]), Sequence::new(vec![2])];

        let names = resolve(&tables)?;
        assert_eq!(names[&0][&0], AssignedName::new(0, "First"));
        assert_eq!(names[&0][&2], AssignedName::new(0, "Second"));
        Ok(())
    }

    #[test]
    fn ports_are_kept_apart() -> anyhow::Result<()> {
        let tables = CueTables {
            cue_names: vec![cue("A", 0)],
            sequences: vec![Sequence::new(vec![0, 1])],
            synths: vec![synth_to(0), synth_to(1)],
            waveforms: vec![wave(0, 3), wave(1, 3)],
        };

        let names = resolve(&tables)?;
        assert_eq!(names[&0][&3], AssignedName::new(0, "A"));
        assert_eq!(names[&1][&3], AssignedName::new(1, "A"));
        Ok(())
    }

    #[test]
    fn track_count_mismatch_is_structural() {
        let mut tables = identity_tables(2);
        tables.cue_names = vec![cue("Broken", 0)];
        tables.sequences = vec![Sequence {
            declared_tracks: 3,
            track_indexes: vec![0, 1],
        }];

        let err = resolve(&tables).unwrap_err();
        assert!(err.is_structural());
        assert!(err.to_string().contains("declares 3 tracks but lists 2"));
    }

    #[test]
    fn out_of_range_indexes_are_structural() {
        let mut tables = identity_tables(1);
        tables.cue_names = vec![cue("Dangling", 0)];
        tables.sequences = vec![Sequence::new(vec![5])];
        assert!(resolve(&tables).unwrap_err().is_structural());

        tables.cue_names = vec![cue("NoSequence", 4)];
        assert!(resolve(&tables).unwrap_err().is_structural());
    }

    #[test]
    fn reference_items_skip_prefix_and_read_big_endian() -> anyhow::Result<()> {
        assert_eq!(decode_reference_items(&[0xff, 0xee, 0x01, 0x02])?, 0x0102);
        assert_eq!(decode_reference_items(&[0x00, 0x01, 0x2a])?, 42);
        assert_eq!(decode_reference_items(&[0, 1, 0, 0, 1, 0])?, 0x100);
        Ok(())
    }

    #[test]
    fn reference_items_too_short_is_structural() {
        assert!(decode_reference_items(&[0x00, 0x01]).unwrap_err().is_structural());
        assert!(decode_reference_items(&[]).unwrap_err().is_structural());
    }
}
