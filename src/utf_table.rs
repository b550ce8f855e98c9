//! Reader for CRI `@UTF` tables.
//!
//! A `@UTF` table is a small big-endian columnar format used by ACB cue sheets (and nested
//! inside them). Layout, with offsets after the size field relative to byte 8:
//!
//! ```text
//! 0x00 "@UTF"
//! 0x04 u32 table size        0x08 u16 encoding      0x0a u16 rows offset
//! 0x0c u32 strings offset    0x10 u32 data offset   0x14 u32 table name (string pool)
//! 0x18 u16 column count      0x1a u16 row width     0x1c u32 row count
//! 0x20 column descriptors: u8 flags | type, u32 name, [inline constant]
//! ```
//!
//! Every value is decoded eagerly; tables are small and callers index them freely.

use crate::{Error, Result};

const MAGIC: &[u8; 4] = b"@UTF";
const HEADER_LEN: usize = 0x20;
const BASE: usize = 0x08;

const FLAG_DEFAULT: u8 = 0x20;
const FLAG_ROW: u8 = 0x40;
const FLAG_UNDEFINED: u8 = 0x80;

/// A decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Data(Vec<u8>),
}

impl Value {
    /// Integer view of this value, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v),
            Value::I8(v) => u64::try_from(v).ok(),
            Value::I16(v) => u64::try_from(v).ok(),
            Value::I32(v) => u64::try_from(v).ok(),
            Value::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }
}

/// A fully decoded `@UTF` table.
#[derive(Debug, Clone)]
pub struct UtfTable {
    name: String,
    columns: Vec<String>,
    // rows[row][column]; `None` for zero-storage columns.
    rows: Vec<Vec<Option<Value>>>,
}

impl UtfTable {
    /// Parse a table from the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let r = Bytes { buf: bytes };

        if bytes.get(..4) != Some(MAGIC.as_slice()) {
            return Err(Error::parse("@UTF table", "missing @UTF magic (encrypted table?)"));
        }

        let table_size = r.u32(0x04)? as usize + BASE;
        if table_size > bytes.len() {
            return Err(Error::parse(
                "@UTF table",
                format!("declared size {table_size} exceeds {} bytes", bytes.len()),
            ));
        }
        let r = Bytes {
            buf: &bytes[..table_size],
        };

        let rows_offset = r.u16(0x0a)? as usize + BASE;
        let strings_offset = r.u32(0x0c)? as usize + BASE;
        let data_offset = r.u32(0x10)? as usize + BASE;
        let name_offset = r.u32(0x14)? as usize;
        let column_count = r.u16(0x18)? as usize;
        let row_width = r.u16(0x1a)? as usize;
        let row_count = r.u32(0x1c)? as usize;

        let pools = Pools {
            r,
            strings_offset,
            data_offset,
        };
        let name = pools.string(name_offset)?;

        let mut schema = Vec::with_capacity(column_count);
        let mut pos = HEADER_LEN;
        for _ in 0..column_count {
            let flags = r.u8(pos)?;
            let column_name = pools.string(r.u32(pos + 1)? as usize)?;
            pos += 5;

            if flags & FLAG_UNDEFINED != 0 {
                return Err(Error::parse(
                    "@UTF table",
                    format!("column '{column_name}' has undefined storage flag"),
                ));
            }

            let kind = flags & 0x0f;
            let width = value_width(kind)?;
            let storage = if flags & FLAG_DEFAULT != 0 {
                let value = pools.value(kind, pos)?;
                pos += width;
                Storage::Constant(value)
            } else if flags & FLAG_ROW != 0 {
                Storage::PerRow(kind)
            } else {
                Storage::Zero
            };
            schema.push((column_name, storage));
        }

        let per_row: usize = schema
            .iter()
            .map(|(_, storage)| match storage {
                Storage::PerRow(kind) => value_width(*kind),
                _ => Ok(0),
            })
            .sum::<Result<usize>>()?;
        if per_row > row_width {
            return Err(Error::parse(
                "@UTF table",
                format!("row width {row_width} is smaller than its columns ({per_row})"),
            ));
        }
        // Zero-width rows are bounded as if one byte wide.
        let rows_len = row_count.checked_mul(row_width.max(1));
        if rows_len.is_none_or(|len| len > table_size.saturating_sub(rows_offset)) {
            return Err(Error::parse(
                "@UTF table",
                format!("{row_count} rows of {row_width} bytes do not fit in {table_size} bytes"),
            ));
        }

        let mut rows = Vec::with_capacity(row_count);
        for row in 0..row_count {
            let mut pos = rows_offset + row * row_width;
            let mut cells = Vec::with_capacity(column_count);
            for (_, storage) in &schema {
                let cell = match storage {
                    Storage::Zero => None,
                    Storage::Constant(value) => Some(value.clone()),
                    Storage::PerRow(kind) => {
                        let value = pools.value(*kind, pos)?;
                        pos += value_width(*kind)?;
                        Some(value)
                    }
                };
                cells.push(cell);
            }
            rows.push(cells);
        }

        Ok(Self {
            name,
            columns: schema.into_iter().map(|(name, _)| name).collect(),
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Raw cell access. `None` when the column is absent or stored as zero.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// Integer cell. Zero-storage columns read as 0.
    pub fn u64(&self, row: usize, column: &str) -> Result<u64> {
        match self.cell(row, column)? {
            None => Ok(0),
            Some(value) => value.as_u64().ok_or_else(|| {
                self.error(format!("column '{column}' is not an unsigned integer"))
            }),
        }
    }

    /// String cell. Zero-storage columns read as "".
    pub fn string(&self, row: usize, column: &str) -> Result<&str> {
        match self.cell(row, column)? {
            None => Ok(""),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(self.error(format!("column '{column}' is not a string"))),
        }
    }

    /// Data cell. Zero-storage columns read as an empty slice.
    pub fn data(&self, row: usize, column: &str) -> Result<&[u8]> {
        match self.cell(row, column)? {
            None => Ok(&[]),
            Some(Value::Data(d)) => Ok(d),
            Some(_) => Err(self.error(format!("column '{column}' is not a data blob"))),
        }
    }

    /// Parse a data cell as a nested table.
    pub fn table(&self, row: usize, column: &str) -> Result<UtfTable> {
        let bytes = self.data(row, column)?;
        UtfTable::parse(bytes).map_err(|err| match err {
            Error::StructuralParse { message, .. } => {
                self.error(format!("nested table '{column}': {message}"))
            }
            other => other,
        })
    }

    fn cell(&self, row: usize, column: &str) -> Result<Option<&Value>> {
        let col = self
            .column_index(column)
            .ok_or_else(|| self.error(format!("missing column '{column}'")))?;
        let cells = self.rows.get(row).ok_or_else(|| {
            self.error(format!(
                "row {row} out of range ({} rows)",
                self.rows.len()
            ))
        })?;
        Ok(cells[col].as_ref())
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    fn error(&self, message: String) -> Error {
        Error::parse(format!("@UTF table '{}'", self.name), message)
    }
}

enum Storage {
    Zero,
    Constant(Value),
    PerRow(u8),
}

fn value_width(kind: u8) -> Result<usize> {
    Ok(match kind {
        0x00 | 0x01 => 1,
        0x02 | 0x03 => 2,
        0x04 | 0x05 | 0x08 | 0x0a => 4,
        0x06 | 0x07 | 0x09 | 0x0b => 8,
        other => {
            return Err(Error::parse(
                "@UTF table",
                format!("unsupported column type {other:#04x}"),
            ));
        }
    })
}

/// Bounds-checked big-endian reads.
#[derive(Clone, Copy)]
struct Bytes<'a> {
    buf: &'a [u8],
}

impl<'a> Bytes<'a> {
    fn slice(&self, pos: usize, len: usize) -> Result<&'a [u8]> {
        pos.checked_add(len)
            .and_then(|end| self.buf.get(pos..end))
            .ok_or_else(|| {
                Error::parse(
                    "@UTF table",
                    format!(
                        "read of {len} bytes at {pos:#x} past end ({:#x})",
                        self.buf.len()
                    ),
                )
            })
    }

    fn array<const N: usize>(&self, pos: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(pos, N)?);
        Ok(out)
    }

    fn u8(&self, pos: usize) -> Result<u8> {
        Ok(self.array::<1>(pos)?[0])
    }

    fn u16(&self, pos: usize) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array(pos)?))
    }

    fn u32(&self, pos: usize) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array(pos)?))
    }

    fn u64(&self, pos: usize) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array(pos)?))
    }
}

struct Pools<'a> {
    r: Bytes<'a>,
    strings_offset: usize,
    data_offset: usize,
}

impl Pools<'_> {
    fn string(&self, offset: usize) -> Result<String> {
        let start = self.strings_offset + offset;
        let tail = self.r.buf.get(start..).ok_or_else(|| {
            Error::parse("@UTF table", format!("string offset {offset:#x} out of range"))
        })?;
        let len = tail.iter().position(|&b| b == 0).ok_or_else(|| {
            Error::parse("@UTF table", format!("unterminated string at {offset:#x}"))
        })?;
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }

    fn value(&self, kind: u8, pos: usize) -> Result<Value> {
        let r = self.r;
        Ok(match kind {
            0x00 => Value::U8(r.u8(pos)?),
            0x01 => Value::I8(r.u8(pos)? as i8),
            0x02 => Value::U16(r.u16(pos)?),
            0x03 => Value::I16(r.u16(pos)? as i16),
            0x04 => Value::U32(r.u32(pos)?),
            0x05 => Value::I32(r.u32(pos)? as i32),
            0x06 => Value::U64(r.u64(pos)?),
            0x07 => Value::I64(r.u64(pos)? as i64),
            0x08 => Value::F32(f32::from_bits(r.u32(pos)?)),
            0x09 => Value::F64(f64::from_bits(r.u64(pos)?)),
            0x0a => Value::String(self.string(r.u32(pos)? as usize)?),
            0x0b => {
                let offset = r.u32(pos)? as usize;
                let size = r.u32(pos + 4)? as usize;
                if size == 0 {
                    Value::Data(Vec::new())
                } else {
                    Value::Data(r.slice(self.data_offset + offset, size)?.to_vec())
                }
            }
            other => {
                return Err(Error::parse(
                    "@UTF table",
                    format!("unsupported column type {other:#04x}"),
                ));
            }
        })
    }
}
