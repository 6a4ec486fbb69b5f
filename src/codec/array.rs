//! Array encoding. The protocol uses two distinct on-wire shapes for the
//! same logical "list of typed values", distinguished only by where the
//! array appears:
//!
//! - a **procedure argument array** is self-describing: it carries its own
//!   `-99` envelope tag and element type tag, because a call's parameter
//!   list otherwise only knows the *declared* scalar type.
//! - a **typed array in a table row** needs neither, since the column (or
//!   field) already carries the element type.
//!
//! Both shapes count elements with int16, except when the element type is
//! TINYINT, where they use int32: the source's workaround so that byte
//! arrays (strings-as-bytes, blobs) can exceed 32K elements.

use super::{read_value, write_value, Reader};
use crate::error::{DecodeError, EncodeError};
use crate::value::{TypeTag, Value};
use bytes::BytesMut;

fn uses_int32_count(elem_tag: TypeTag) -> bool {
    elem_tag == TypeTag::TinyInt
}

fn read_count(r: &mut Reader, elem_tag: TypeTag) -> Result<usize, DecodeError> {
    let count = if uses_int32_count(elem_tag) {
        super::scalar::read_raw_i32(r)?
    } else {
        super::scalar::read_raw_i16(r)? as i32
    };
    Ok(count.max(0) as usize)
}

fn write_count(buf: &mut BytesMut, elem_tag: TypeTag, count: usize) {
    if uses_int32_count(elem_tag) {
        buf.extend_from_slice(&(count as i32).to_be_bytes());
    } else {
        buf.extend_from_slice(&(count as i16).to_be_bytes());
    }
}

/// Read a typed array with no envelope: count prefix, then that many
/// elements of `elem_tag`'s domain.
pub fn read_typed_array(r: &mut Reader, elem_tag: TypeTag) -> Result<Vec<Value>, DecodeError> {
    let count = read_count(r, elem_tag)?;
    let mut values = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        values.push(read_value(r, elem_tag)?);
    }
    Ok(values)
}

/// Write a typed array with no envelope (the table-row / response-field shape).
pub fn write_typed_array(buf: &mut BytesMut, elem_tag: TypeTag, values: &[Value]) -> Result<(), EncodeError> {
    write_count(buf, elem_tag, values.len());
    for v in values {
        write_value(buf, v)?;
    }
    Ok(())
}

/// Read a self-describing procedure-argument array envelope. The leading
/// `-99` tag byte itself must already have been consumed by the caller
/// (it is how the caller knew to dispatch here in the first place).
pub fn read_array_envelope(r: &mut Reader) -> Result<(TypeTag, Vec<Value>), DecodeError> {
    let elem_tag = TypeTag::from_i8(super::scalar::read_byte(r)? as i8)?;
    let values = read_typed_array(r, elem_tag)?;
    Ok((elem_tag, values))
}

/// Write a self-describing procedure-argument array envelope: `-99` tag,
/// element type tag, count, elements.
pub fn write_array_envelope(buf: &mut BytesMut, elem_tag: TypeTag, values: &[Value]) -> Result<(), EncodeError> {
    super::scalar::write_byte(buf, TypeTag::Array.as_i8() as u8);
    super::scalar::write_byte(buf, elem_tag.as_i8() as u8);
    write_typed_array(buf, elem_tag, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_array_round_trips() {
        let values = vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)];
        let mut buf = BytesMut::new();
        write_array_envelope(&mut buf, TypeTag::Integer, &values).unwrap();

        let mut r = Reader::new(&buf);
        let tag = super::super::scalar::read_byte(&mut r).unwrap();
        assert_eq!(tag as i8, TypeTag::Array.as_i8());
        let (elem_tag, decoded) = read_array_envelope(&mut r).unwrap();
        assert_eq!(elem_tag, TypeTag::Integer);
        assert_eq!(decoded, values);
    }

    #[test]
    fn tinyint_array_uses_int32_count() {
        let values: Vec<Value> = (0..5).map(Value::TinyInt).collect();
        let mut buf = BytesMut::new();
        write_typed_array(&mut buf, TypeTag::TinyInt, &values).unwrap();
        // First 4 bytes are an int32 count, not int16.
        assert_eq!(&buf[0..4], &5i32.to_be_bytes());
    }

    #[test]
    fn string_array_uses_int16_count() {
        let values = vec![Value::Str("a".into()), Value::Str("b".into())];
        let mut buf = BytesMut::new();
        write_typed_array(&mut buf, TypeTag::Str, &values).unwrap();
        assert_eq!(&buf[0..2], &2i16.to_be_bytes());
    }
}
