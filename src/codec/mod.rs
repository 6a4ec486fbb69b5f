//! Binary codec for the protocol's scalar, array, and composite value types.
//!
//! This module is pure, synchronous computation: a [`Reader`] walks a byte
//! slice and a [`Writer`] appends to a [`bytes::BytesMut`]. No I/O, no
//! async, no tokio: the connection engine (`crate::connection`) is the
//! only thing that touches a socket; this layer just turns bytes into
//! typed [`crate::Value`]s and back.

pub mod array;
pub mod decimal;
pub mod exception;
pub mod scalar;
pub mod table;

use crate::error::DecodeError;

/// Byte order used when reading multi-byte scalars.
///
/// The wire is always big-endian in production; `Little` exists only so
/// tests can feed hand-built little-endian buffers through the same
/// decoder without a second code path. Writers are always big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// A cursor over a borrowed byte slice, used for all decoding.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, order: ByteOrder::Big }
    }

    pub fn with_order(buf: &'a [u8], order: ByteOrder) -> Self {
        Self { buf, pos: 0, order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take `n` bytes, advancing the cursor, or fail with a framing error
    /// naming what the caller was trying to read.
    pub(crate) fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Frame { context });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Assert the cursor has advanced exactly `expected` bytes since `start`,
    /// used to validate the nested length prefixes in table framing.
    pub(crate) fn assert_consumed(
        &self,
        start: usize,
        expected: usize,
        context: &'static str,
    ) -> Result<(), DecodeError> {
        if self.pos.saturating_sub(start) != expected {
            return Err(DecodeError::Frame { context });
        }
        Ok(())
    }
}

pub use array::{read_array_envelope, read_typed_array, write_array_envelope, write_typed_array};
pub use exception::ServerException;
pub use table::{ColumnDescriptor, Table};

use crate::error::EncodeError;
use crate::value::{TypeTag, Value};
use bytes::BytesMut;

/// Decode one value whose domain is already known from context (a column
/// descriptor or an array's element type); the tag byte itself, if any,
/// has already been consumed by the caller.
pub fn read_value(r: &mut Reader, tag: TypeTag) -> Result<Value, DecodeError> {
    Ok(match tag {
        TypeTag::Null => Value::Null,
        TypeTag::TinyInt => scalar::read_i8(r)?.map(Value::TinyInt).unwrap_or(Value::Null),
        TypeTag::SmallInt => scalar::read_i16(r)?.map(Value::SmallInt).unwrap_or(Value::Null),
        TypeTag::Integer => scalar::read_i32(r)?.map(Value::Integer).unwrap_or(Value::Null),
        TypeTag::BigInt => scalar::read_i64(r)?.map(Value::BigInt).unwrap_or(Value::Null),
        TypeTag::Money => scalar::read_i64(r)?.map(Value::BigInt).unwrap_or(Value::Null),
        TypeTag::Float => scalar::read_f64(r)?.map(Value::Float).unwrap_or(Value::Null),
        TypeTag::Str => scalar::read_string(r)?.map(Value::Str).unwrap_or(Value::Null),
        TypeTag::Timestamp => scalar::read_timestamp(r)?.map(Value::Timestamp).unwrap_or(Value::Null),
        TypeTag::Decimal => match decimal::read_decimal(r)? {
            None => Value::Null,
            Some(d) => Value::Decimal(
                d.to_rust_decimal()
                    .ok_or(DecodeError::Frame { context: "decimal exceeds representable range" })?,
            ),
        },
        TypeTag::DecimalString => match decimal::read_decimal_string(r)? {
            None => Value::Null,
            Some(d) => Value::Decimal(
                d.to_rust_decimal()
                    .ok_or(DecodeError::Frame { context: "decimal exceeds representable range" })?,
            ),
        },
        TypeTag::Varbinary => scalar::read_varbinary(r)?.map(Value::Varbinary).unwrap_or(Value::Null),
        TypeTag::VoltTable | TypeTag::Array => return Err(DecodeError::UnknownTag(tag.as_i8())),
    })
}

/// Encode one value's raw bytes (no tag prefix). Callers that need a
/// self-describing wire-type prefix (procedure scalar arguments) write the
/// tag byte themselves first.
pub fn write_value(buf: &mut BytesMut, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Null => {
            // A bare NULL has no canonical width; callers encode null
            // through the sentinel of whatever type was declared instead.
        }
        Value::TinyInt(v) => scalar::write_i8(buf, Some(*v)),
        Value::SmallInt(v) => scalar::write_i16(buf, Some(*v)),
        Value::Integer(v) => scalar::write_i32(buf, Some(*v)),
        Value::BigInt(v) => scalar::write_i64(buf, Some(*v)),
        Value::Float(v) => scalar::write_f64(buf, Some(*v)),
        Value::Str(s) => scalar::write_string(buf, Some(s)),
        Value::Timestamp(v) => scalar::write_timestamp(buf, Some(*v)),
        Value::Decimal(d) => {
            let fixed = decimal::Decimal::from_rust_decimal(*d)?;
            decimal::write_decimal(buf, Some(fixed));
        }
        Value::Varbinary(bytes) => scalar::write_varbinary(buf, Some(bytes)),
        Value::Table(_) => {
            return Err(EncodeError::TypeMismatch("result tables cannot be sent as procedure arguments"));
        }
        Value::Array(elem_tag, values) => {
            array::write_typed_array(buf, *elem_tag, values)?;
        }
    }
    Ok(())
}

/// Encode a null of a specific declared type (needed when the caller has
/// no `Value` payload but must still emit that type's sentinel).
pub fn write_null(buf: &mut BytesMut, tag: TypeTag) {
    match tag {
        TypeTag::Null => {}
        TypeTag::TinyInt => scalar::write_i8(buf, None),
        TypeTag::SmallInt => scalar::write_i16(buf, None),
        TypeTag::Integer => scalar::write_i32(buf, None),
        TypeTag::BigInt | TypeTag::Money => scalar::write_i64(buf, None),
        TypeTag::Float => scalar::write_f64(buf, None),
        TypeTag::Str => scalar::write_string(buf, None),
        TypeTag::Timestamp => scalar::write_timestamp(buf, None),
        TypeTag::Decimal => decimal::write_decimal(buf, None),
        TypeTag::DecimalString => decimal::write_decimal_string(buf, None),
        TypeTag::Varbinary => scalar::write_varbinary(buf, None),
        TypeTag::VoltTable | TypeTag::Array => {}
    }
}
