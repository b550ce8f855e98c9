use std::io::Write;

use serde::Serialize;

use crate::Result;

/// Writes records as a single JSON array, one element at a time.
///
/// Design:
/// - We stream output directly to a `Write` implementation so a large table never has to be
///   held in memory.
/// - The encoder is stateful so we can emit a well-formed JSON array incrementally.
///
/// Example output:
/// ```json
/// [{"id":1,"name":"Default"},{"id":2,"name":"Festival"}]
/// ```
pub struct JsonArrayEncoder<W: Write> {
    w: W,

    /// Whether we have written the opening `[`.
    started: bool,

    /// Whether the next element is the first, so we know where commas go.
    first: bool,

    /// Once closed, no further writes are allowed.
    closed: bool,

    written: usize,
}

impl<W: Write> JsonArrayEncoder<W> {
    /// The array is opened lazily, on the first write or on close.
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            first: true,
            closed: false,
            written: 0,
        }
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            self.w.write_all(b"[")?;
            self.started = true;
        }
        Ok(())
    }

    /// Serialize one record and append it to the array.
    pub fn write_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write record: encoder is already closed",
            ));
        }

        self.start_if_needed()?;

        if !self.first {
            self.w.write_all(b",")?;
        }
        self.first = false;

        serde_json::to_writer(&mut self.w, record)?;
        self.written += 1;
        Ok(())
    }

    /// Finalize the array and flush the underlying writer.
    ///
    /// Idempotent. An encoder closed without records still emits `[]`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.start_if_needed()?;
        self.w.write_all(b"]")?;
        self.w.flush()?;

        self.closed = true;
        Ok(())
    }
}
