//! Fixed-width scalar primitives: signed integers, float64, UTF-8 strings,
//! and raw byte strings, each with their null-sentinel encoding.

use super::{ByteOrder, Reader};
use crate::error::DecodeError;
use bytes::{BufMut, BytesMut};

pub const NULL_TINYINT: i8 = -128;
pub const NULL_SMALLINT: i16 = -32768;
pub const NULL_INTEGER: i32 = -2_147_483_648;
pub const NULL_BIGINT: i64 = -9_223_372_036_854_775_808;
/// The protocol's nominal float null sentinel. Servers have been observed
/// to round this value, so reads use [`FLOAT_NULL_TOLERANCE`] instead of
/// exact equality.
pub const NULL_FLOAT: f64 = -1.7e308;
/// Any value within this distance of [`NULL_FLOAT`] decodes to null.
pub const FLOAT_NULL_TOLERANCE: f64 = 1e307;
/// Length-prefix value meaning "this string/varbinary is null".
pub const NULL_LENGTH: i32 = -1;

fn read_bytes<'a>(r: &mut Reader<'a>, n: usize, ctx: &'static str) -> Result<&'a [u8], DecodeError> {
    r.take(n, ctx)
}

pub fn read_i8(r: &mut Reader) -> Result<Option<i8>, DecodeError> {
    let b = read_bytes(r, 1, "tinyint")?[0] as i8;
    Ok(if b == NULL_TINYINT { None } else { Some(b) })
}

pub fn write_i8(buf: &mut BytesMut, v: Option<i8>) {
    buf.put_i8(v.unwrap_or(NULL_TINYINT));
}

pub fn read_i16(r: &mut Reader) -> Result<Option<i16>, DecodeError> {
    let bytes = read_bytes(r, 2, "smallint")?;
    let v = match r.order() {
        ByteOrder::Big => i16::from_be_bytes([bytes[0], bytes[1]]),
        ByteOrder::Little => i16::from_le_bytes([bytes[0], bytes[1]]),
    };
    Ok(if v == NULL_SMALLINT { None } else { Some(v) })
}

pub fn write_i16(buf: &mut BytesMut, v: Option<i16>) {
    buf.put_i16(v.unwrap_or(NULL_SMALLINT));
}

pub fn read_i32(r: &mut Reader) -> Result<Option<i32>, DecodeError> {
    let bytes = read_bytes(r, 4, "integer")?;
    let v = match r.order() {
        ByteOrder::Big => i32::from_be_bytes(bytes.try_into().unwrap()),
        ByteOrder::Little => i32::from_le_bytes(bytes.try_into().unwrap()),
    };
    Ok(if v == NULL_INTEGER { None } else { Some(v) })
}

pub fn write_i32(buf: &mut BytesMut, v: Option<i32>) {
    buf.put_i32(v.unwrap_or(NULL_INTEGER));
}

/// Read a raw (non-nullable) int32, used for length prefixes and counts.
pub fn read_raw_i32(r: &mut Reader) -> Result<i32, DecodeError> {
    let bytes = read_bytes(r, 4, "length prefix")?;
    Ok(match r.order() {
        ByteOrder::Big => i32::from_be_bytes(bytes.try_into().unwrap()),
        ByteOrder::Little => i32::from_le_bytes(bytes.try_into().unwrap()),
    })
}

/// Read a raw (non-nullable) int16, used for array counts and column counts.
pub fn read_raw_i16(r: &mut Reader) -> Result<i16, DecodeError> {
    let bytes = read_bytes(r, 2, "count prefix")?;
    Ok(match r.order() {
        ByteOrder::Big => i16::from_be_bytes([bytes[0], bytes[1]]),
        ByteOrder::Little => i16::from_le_bytes([bytes[0], bytes[1]]),
    })
}

pub fn read_i64(r: &mut Reader) -> Result<Option<i64>, DecodeError> {
    let bytes = read_bytes(r, 8, "bigint")?;
    let v = match r.order() {
        ByteOrder::Big => i64::from_be_bytes(bytes.try_into().unwrap()),
        ByteOrder::Little => i64::from_le_bytes(bytes.try_into().unwrap()),
    };
    Ok(if v == NULL_BIGINT { None } else { Some(v) })
}

pub fn write_i64(buf: &mut BytesMut, v: Option<i64>) {
    buf.put_i64(v.unwrap_or(NULL_BIGINT));
}

/// Read a raw (non-nullable) int64, e.g. the client handle field.
pub fn read_raw_i64(r: &mut Reader) -> Result<i64, DecodeError> {
    let bytes = read_bytes(r, 8, "handle")?;
    Ok(match r.order() {
        ByteOrder::Big => i64::from_be_bytes(bytes.try_into().unwrap()),
        ByteOrder::Little => i64::from_le_bytes(bytes.try_into().unwrap()),
    })
}

pub fn read_byte(r: &mut Reader) -> Result<u8, DecodeError> {
    Ok(read_bytes(r, 1, "byte")?[0])
}

pub fn write_byte(buf: &mut BytesMut, v: u8) {
    buf.put_u8(v);
}

pub fn read_f64(r: &mut Reader) -> Result<Option<f64>, DecodeError> {
    let bytes = read_bytes(r, 8, "float")?;
    let v = match r.order() {
        ByteOrder::Big => f64::from_be_bytes(bytes.try_into().unwrap()),
        ByteOrder::Little => f64::from_le_bytes(bytes.try_into().unwrap()),
    };
    Ok(if (v - NULL_FLOAT).abs() < FLOAT_NULL_TOLERANCE { None } else { Some(v) })
}

pub fn write_f64(buf: &mut BytesMut, v: Option<f64>) {
    buf.put_f64(v.unwrap_or(NULL_FLOAT));
}

pub fn read_string(r: &mut Reader) -> Result<Option<String>, DecodeError> {
    let len = read_raw_i32(r)?;
    if len == NULL_LENGTH {
        return Ok(None);
    }
    if len == 0 {
        return Ok(Some(String::new()));
    }
    let bytes = read_bytes(r, len as usize, "string contents")?;
    let s = std::str::from_utf8(bytes).map_err(|_| DecodeError::BadUtf8)?;
    Ok(Some(s.to_string()))
}

pub fn write_string(buf: &mut BytesMut, v: Option<&str>) {
    match v {
        None => buf.put_i32(NULL_LENGTH),
        Some(s) => {
            let bytes = s.as_bytes();
            buf.put_i32(bytes.len() as i32);
            buf.extend_from_slice(bytes);
        }
    }
}

pub fn read_varbinary(r: &mut Reader) -> Result<Option<Vec<u8>>, DecodeError> {
    let len = read_raw_i32(r)?;
    if len == NULL_LENGTH {
        return Ok(None);
    }
    if len == 0 {
        return Ok(Some(Vec::new()));
    }
    let bytes = read_bytes(r, len as usize, "varbinary contents")?;
    Ok(Some(bytes.to_vec()))
}

pub fn write_varbinary(buf: &mut BytesMut, v: Option<&[u8]>) {
    match v {
        None => buf.put_i32(NULL_LENGTH),
        Some(bytes) => {
            buf.put_i32(bytes.len() as i32);
            buf.extend_from_slice(bytes);
        }
    }
}

/// Read the raw microsecond-since-epoch timestamp value (BIGINT on the wire).
pub fn read_timestamp(r: &mut Reader) -> Result<Option<i64>, DecodeError> {
    read_i64(r)
}

pub fn write_timestamp(buf: &mut BytesMut, v: Option<i64>) {
    write_i64(buf, v);
}

#[cfg(feature = "chrono")]
pub fn timestamp_to_datetime(micros: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_micros(micros).unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
}

#[cfg(feature = "chrono")]
pub fn datetime_to_timestamp(dt: chrono::DateTime<chrono::Utc>) -> i64 {
    dt.timestamp_micros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tinyint_round_trip_and_null() {
        let mut buf = BytesMut::new();
        write_i8(&mut buf, Some(42));
        write_i8(&mut buf, None);
        let mut r = Reader::new(&buf);
        assert_eq!(read_i8(&mut r).unwrap(), Some(42));
        assert_eq!(read_i8(&mut r).unwrap(), None);
    }

    #[test]
    fn bigint_sentinel_is_null() {
        let mut buf = BytesMut::new();
        write_i64(&mut buf, None);
        let mut r = Reader::new(&buf);
        assert_eq!(read_i64(&mut r).unwrap(), None);
    }

    #[test]
    fn float_null_tolerance_is_wide() {
        let mut buf = BytesMut::new();
        // Slightly off from the exact sentinel, as a rounding sender might produce.
        buf.put_f64(NULL_FLOAT + 1e306);
        let mut r = Reader::new(&buf);
        assert_eq!(read_f64(&mut r).unwrap(), None);
    }

    #[test]
    fn float_outside_tolerance_is_not_null() {
        let mut buf = BytesMut::new();
        buf.put_f64(3.14159);
        let mut r = Reader::new(&buf);
        assert_eq!(read_f64(&mut r).unwrap(), Some(3.14159));
    }

    #[test]
    fn string_round_trip() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, Some("hello, world"));
        let mut r = Reader::new(&buf);
        assert_eq!(read_string(&mut r).unwrap(), Some("hello, world".to_string()));
    }

    #[test]
    fn string_null_and_empty_are_distinct() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, None);
        write_string(&mut buf, Some(""));
        let mut r = Reader::new(&buf);
        assert_eq!(read_string(&mut r).unwrap(), None);
        assert_eq!(read_string(&mut r).unwrap(), Some(String::new()));
    }

    #[test]
    fn invalid_utf8_is_bad_utf8_error() {
        let mut buf = BytesMut::new();
        buf.put_i32(3);
        buf.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        let mut r = Reader::new(&buf);
        assert_eq!(read_string(&mut r), Err(DecodeError::BadUtf8));
    }

    #[test]
    fn varbinary_round_trip_and_null() {
        let mut buf = BytesMut::new();
        write_varbinary(&mut buf, Some(&[1, 2, 3, 4]));
        write_varbinary(&mut buf, None);
        let mut r = Reader::new(&buf);
        assert_eq!(read_varbinary(&mut r).unwrap(), Some(vec![1, 2, 3, 4]));
        assert_eq!(read_varbinary(&mut r).unwrap(), None);
    }

    #[test]
    fn truncated_buffer_is_frame_error_not_panic() {
        let buf = BytesMut::from(&[0u8, 0, 0][..]);
        let mut r = Reader::new(&buf);
        assert!(matches!(read_i32(&mut r), Err(DecodeError::Frame { .. })));
    }
}
