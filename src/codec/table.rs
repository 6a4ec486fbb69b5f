//! Result table framing: column metadata followed by rows, each nested
//! length prefix checked against the bytes actually consumed so a
//! truncated or malformed table fails with [`DecodeError::Frame`] instead
//! of reading past the end of the buffer or silently misaligning.

use super::scalar::{read_byte, read_raw_i16, read_raw_i32, read_string, write_byte, write_string};
use super::{read_value, write_value, Reader};
use crate::error::{DecodeError, EncodeError};
use crate::value::{TypeTag, Value};
use bytes::BytesMut;

/// (type tag, column name). An empty name is a known server quirk for
/// result sets whose columns are not individually projected; two
/// empty-named columns compare equal regardless of type so callers don't
/// have to special-case "modified tuples"-style anonymous columns.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub tag: TypeTag,
    pub name: String,
}

impl PartialEq for ColumnDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if self.name.is_empty() || other.name.is_empty() {
            return true;
        }
        self.tag == other.tag && self.name == other.name
    }
}

/// A decoded result table: column metadata plus rows, each row holding
/// exactly `columns.len()` cells typed per their column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn decode(r: &mut Reader) -> Result<Self, DecodeError> {
        let table_size = read_raw_i32(r)?;
        let table_start = r.position();

        let metadata_size = read_raw_i32(r)?;
        let metadata_start = r.position();

        let _status_code = read_byte(r)?;
        let column_count = read_raw_i16(r)? as usize;

        let mut columns = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            let tag = TypeTag::from_i8(read_byte(r)? as i8)?;
            let name = read_string(r)?.unwrap_or_default();
            columns.push(ColumnDescriptor { tag, name });
        }
        r.assert_consumed(metadata_start, metadata_size.max(0) as usize, "table metadata")?;

        let row_count = read_raw_i32(r)?.max(0) as usize;
        let mut rows = Vec::with_capacity(row_count.min(1 << 20));
        for _ in 0..row_count {
            let row_size = read_raw_i32(r)?;
            let row_start = r.position();
            let mut row = Vec::with_capacity(column_count);
            for col in &columns {
                row.push(read_value(r, col.tag)?);
            }
            r.assert_consumed(row_start, row_size.max(0) as usize, "table row")?;
            rows.push(row);
        }

        r.assert_consumed(table_start, table_size.max(0) as usize, "table")?;
        Ok(Self { columns, rows })
    }

    /// Encode back to wire bytes. Mainly exercised by tests (constructing
    /// a table, then truncating its bytes to prove `decode` never panics).
    pub fn encode(&self) -> Result<BytesMut, EncodeError> {
        let mut metadata = BytesMut::new();
        write_byte(&mut metadata, 0); // status_code
        metadata.extend_from_slice(&(self.columns.len() as i16).to_be_bytes());
        for col in &self.columns {
            write_byte(&mut metadata, col.tag.as_i8() as u8);
            write_string(&mut metadata, Some(&col.name));
        }

        let mut body = BytesMut::new();
        body.extend_from_slice(&(metadata.len() as i32).to_be_bytes());
        body.extend_from_slice(&metadata);

        body.extend_from_slice(&(self.rows.len() as i32).to_be_bytes());
        for row in &self.rows {
            let mut row_buf = BytesMut::new();
            for cell in row.iter() {
                write_value(&mut row_buf, cell)?;
            }
            body.extend_from_slice(&(row_buf.len() as i32).to_be_bytes());
            body.extend_from_slice(&row_buf);
        }

        let mut out = BytesMut::new();
        out.extend_from_slice(&(body.len() as i32).to_be_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "{}", header.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:?}")).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        write!(f, "({} row{})", self.rows.len(), if self.rows.len() == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table {
            columns: vec![
                ColumnDescriptor { tag: TypeTag::Str, name: "language".into() },
                ColumnDescriptor { tag: TypeTag::Str, name: "greeting".into() },
            ],
            rows: vec![
                vec![Value::Str("English".into()), Value::Str("Hello".into())],
                vec![Value::Str("French".into()), Value::Str("Bonjour".into())],
            ],
        }
    }

    #[test]
    fn round_trips_through_wire_bytes() {
        let table = sample_table();
        let bytes = table.encode().unwrap();
        let mut r = Reader::new(&bytes);
        let decoded = Table::decode(&mut r).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn empty_named_columns_compare_equal_regardless_of_type() {
        let a = ColumnDescriptor { tag: TypeTag::Integer, name: String::new() };
        let b = ColumnDescriptor { tag: TypeTag::Str, name: String::new() };
        assert_eq!(a, b);
    }

    #[test]
    fn truncation_at_any_byte_is_frame_error_never_panic() {
        let table = sample_table();
        let bytes = table.encode().unwrap();
        for cut in 0..bytes.len() {
            let truncated = &bytes[..cut];
            let mut r = Reader::new(truncated);
            let result = Table::decode(&mut r);
            assert!(result.is_err(), "expected an error when truncated to {cut} bytes");
        }
    }
}
