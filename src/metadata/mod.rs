//! Static game metadata export.
//!
//! A title's metadata document is one JSON object holding one array per table:
//!
//! ```json
//! {"mapIcon":[...],"namePlate":[...],"systemVoice":[...],"trophy":[...],"chart":[...]}
//! ```
//!
//! Tables are streamed row by row as their source files are read.

pub mod chart;
pub mod json_array;
pub mod xml;

use std::io::Write;

use serde::Serialize;

use crate::Result;
use json_array::JsonArrayEncoder;

pub use chart::{ChartRow, MissingFieldWarning};

/// Map icons, name plates and the like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticItem {
    pub id: i64,
    pub name: String,
    pub sort_name: String,
    pub image_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemVoiceItem {
    #[serde(flatten)]
    pub item: StaticItem,
    pub cue_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trophy {
    pub id: i64,
    pub name: String,
    pub rare_type: i64,
    pub explain_text: String,
}

/// What an export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// `(table, rows)` in document order.
    pub tables: Vec<(&'static str, usize)>,
    pub warnings: Vec<MissingFieldWarning>,
}

impl ExportSummary {
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, rows)| *rows)
    }
}

/// Streams a `{"table": [...], ...}` document.
pub struct DocumentWriter<W: Write> {
    w: W,
    tables: usize,
    closed: bool,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            tables: 0,
            closed: false,
        }
    }

    /// Write one table. Stops at the first row error, leaving the document unterminated.
    pub fn table<T, I>(&mut self, name: &str, rows: I) -> Result<usize>
    where
        T: Serialize,
        I: IntoIterator<Item = Result<T>>,
    {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write table: document is already closed",
            ));
        }

        self.w
            .write_all(if self.tables == 0 { b"{" } else { b"," })?;
        serde_json::to_writer(&mut self.w, name)?;
        self.w.write_all(b":")?;
        self.tables += 1;

        let mut enc = JsonArrayEncoder::new(&mut self.w);
        for row in rows {
            enc.write_record(&row?)?;
        }
        enc.close()?;
        Ok(enc.written())
    }

    /// Idempotent. A document with no tables is `{}`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.tables == 0 {
            self.w.write_all(b"{")?;
        }
        self.w.write_all(b"}\n")?;
        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}
