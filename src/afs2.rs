//! Reader for AFS2 audio banks (`.awb`).
//!
//! An AFS2 bank is a flat archive of raw sub-streams (HCA/ADX payloads) addressed by id.
//! Everything is little-endian:
//!
//! ```text
//! 0x00 "AFS2"   0x04 u8 version   0x05 u8 offset width   0x06 u16 id width
//! 0x08 u32 stream count           0x0c u16 alignment     0x0e u16 subkey
//! 0x10 ids[count], offsets[count + 1]
//! ```
//!
//! Stream `i` spans `align_up(offsets[i], alignment) .. offsets[i + 1]`.

use std::path::Path;

use crate::{Error, Result};

const MAGIC: &[u8; 4] = b"AFS2";
const HEADER_LEN: usize = 0x10;

/// Location of one sub-stream inside a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: u64,
    pub start: usize,
    pub end: usize,
}

/// A parsed bank that owns its bytes.
#[derive(Debug, Clone)]
pub struct Afs2Bank {
    bytes: Vec<u8>,
    entries: Vec<StreamEntry>,
}

impl Afs2Bank {
    /// Read and parse a bank file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::parse(bytes).map_err(|err| match err {
            Error::StructuralParse { message, .. } => {
                Error::parse(format!("AFS2 bank {}", path.display()), message)
            }
            other => other,
        })
    }

    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let entries = parse_entries(&bytes)?;
        Ok(Self { bytes, entries })
    }

    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payload of the stream at `entry`.
    pub fn stream(&self, entry: &StreamEntry) -> &[u8] {
        &self.bytes[entry.start..entry.end]
    }

    /// Iterate `(id, payload)` in bank order.
    pub fn streams(&self) -> impl Iterator<Item = (u64, &[u8])> + '_ {
        self.entries.iter().map(|e| (e.id, self.stream(e)))
    }

    /// Consume the bank into owned `(id, payload)` pairs.
    pub fn into_streams(self) -> impl Iterator<Item = (u64, Vec<u8>)> {
        let Self { bytes, entries } = self;
        entries
            .into_iter()
            .map(move |e| (e.id, bytes[e.start..e.end].to_vec()))
    }
}

fn parse_entries(bytes: &[u8]) -> Result<Vec<StreamEntry>> {
    let err = |message: String| Error::parse("AFS2 bank", message);

    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(err("missing AFS2 magic".to_owned()));
    }

    let offset_width = bytes[5] as usize;
    let id_width = u16::from_le_bytes([bytes[6], bytes[7]]) as usize;
    let count = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let alignment = u16::from_le_bytes([bytes[12], bytes[13]]).max(1) as usize;

    if !matches!(offset_width, 1..=8) || !matches!(id_width, 1..=8) {
        return Err(err(format!(
            "unsupported field widths (offset {offset_width}, id {id_width})"
        )));
    }

    let read_le = |pos: usize, width: usize| -> Result<u64> {
        let field = bytes
            .get(pos..pos + width)
            .ok_or_else(|| err(format!("header truncated at {pos:#x}")))?;
        Ok(field
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    };

    let table_len = count
        .checked_mul(id_width)
        .zip(count.checked_add(1).and_then(|n| n.checked_mul(offset_width)))
        .and_then(|(ids, offsets)| ids.checked_add(offsets));
    if table_len.is_none_or(|len| len > bytes.len() - HEADER_LEN) {
        return Err(err(format!("{count} streams do not fit in {:#x} bytes", bytes.len())));
    }

    let ids_at = HEADER_LEN;
    let offsets_at = ids_at + count * id_width;

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let id = read_le(ids_at + i * id_width, id_width)?;
        let start = read_le(offsets_at + i * offset_width, offset_width)?;
        let end = read_le(offsets_at + (i + 1) * offset_width, offset_width)?;
        let (Some(start), Ok(end)) = (
            usize::try_from(start)
                .ok()
                .and_then(|s| s.checked_next_multiple_of(alignment)),
            usize::try_from(end),
        ) else {
            return Err(err(format!("stream {id} offsets {start:#x}..{end:#x} overflow")));
        };

        if start > end || end > bytes.len() {
            return Err(err(format!(
                "stream {id} spans {start:#x}..{end:#x} outside {:#x} bytes",
                bytes.len()
            )));
        }
        entries.push(StreamEntry { id, start, end });
    }

    Ok(entries)
}
