//! Typed values exchanged with the server: the wire's type tags, the
//! runtime [`Value`] enum they decode into, and the [`Arg`] variant callers
//! use to supply procedure parameters.

use crate::codec::table::Table;
use crate::error::{DecodeError, EncodeError};
use rust_decimal::Decimal;

/// A single byte identifying a value's wire domain (§3 of the protocol).
///
/// The source implementation discovers "is this an array?" by probing
/// whether a Python object supports iteration. A statically typed client
/// cannot do that, so every parameter and every table cell carries its tag
/// explicitly instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum TypeTag {
    Null = 1,
    TinyInt = 3,
    SmallInt = 4,
    Integer = 5,
    BigInt = 6,
    Float = 8,
    Str = 9,
    Timestamp = 11,
    Money = 20,
    VoltTable = 21,
    Decimal = 22,
    DecimalString = 23,
    Varbinary = 25,
    Array = -99,
}

impl TypeTag {
    /// Recover a tag from its wire byte.
    pub fn from_i8(byte: i8) -> Result<Self, DecodeError> {
        Ok(match byte {
            1 => TypeTag::Null,
            3 => TypeTag::TinyInt,
            4 => TypeTag::SmallInt,
            5 => TypeTag::Integer,
            6 => TypeTag::BigInt,
            8 => TypeTag::Float,
            9 => TypeTag::Str,
            11 => TypeTag::Timestamp,
            20 => TypeTag::Money,
            21 => TypeTag::VoltTable,
            22 => TypeTag::Decimal,
            23 => TypeTag::DecimalString,
            25 => TypeTag::Varbinary,
            -99 => TypeTag::Array,
            other => return Err(DecodeError::UnknownTag(other)),
        })
    }

    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

/// A decoded wire value. `Null` stands for any domain's sentinel, since the
/// sentinel carries no payload once recognized.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    Str(String),
    /// Raw microseconds since the Unix epoch. See [`crate::codec::scalar`]
    /// for the optional `chrono` conversion helpers.
    Timestamp(i64),
    Decimal(Decimal),
    Varbinary(Vec<u8>),
    Table(Table),
    Array(TypeTag, Vec<Value>),
}

impl Value {
    /// The wire tag this value would be encoded with.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::TinyInt(_) => TypeTag::TinyInt,
            Value::SmallInt(_) => TypeTag::SmallInt,
            Value::Integer(_) => TypeTag::Integer,
            Value::BigInt(_) => TypeTag::BigInt,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::Timestamp(_) => TypeTag::Timestamp,
            Value::Decimal(_) => TypeTag::Decimal,
            Value::Varbinary(_) => TypeTag::Varbinary,
            Value::Table(_) => TypeTag::VoltTable,
            Value::Array(_, _) => TypeTag::Array,
        }
    }
}

/// A procedure call argument, as supplied by the caller.
///
/// The source inspects each Python argument at call time to decide whether
/// it is a scalar or an array. Per the redesign notes this implementation
/// requires the caller to say so explicitly instead, so a mismatch between
/// the declared parameter type and the argument shape is caught at encode
/// time rather than by accident at the protocol boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Scalar(Value),
    Array(TypeTag, Vec<Value>),
}

impl Arg {
    /// Validate that this argument's runtime shape matches `declared`.
    pub(crate) fn check_declared(&self, declared: TypeTag) -> Result<(), EncodeError> {
        match (self, declared) {
            (Arg::Array(_, _), TypeTag::Array) => Ok(()),
            (Arg::Scalar(_), other) if other != TypeTag::Array => Ok(()),
            _ => Err(EncodeError::TypeMismatch(
                "argument shape (scalar/array) does not match the declared parameter type",
            )),
        }
    }
}

impl From<i8> for Arg {
    fn from(v: i8) -> Self {
        Arg::Scalar(Value::TinyInt(v))
    }
}
impl From<i16> for Arg {
    fn from(v: i16) -> Self {
        Arg::Scalar(Value::SmallInt(v))
    }
}
impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Scalar(Value::Integer(v))
    }
}
impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Scalar(Value::BigInt(v))
    }
}
impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Scalar(Value::Float(v))
    }
}
impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Scalar(Value::Str(v.to_string()))
    }
}
impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Scalar(Value::Str(v))
    }
}
impl From<Decimal> for Arg {
    fn from(v: Decimal) -> Self {
        Arg::Scalar(Value::Decimal(v))
    }
}
