//! A named stored procedure and its ordered parameter types, and the call
//! payload serialization that pairs a descriptor with concrete arguments.

use crate::codec::{array, decimal, scalar, write_value};
use crate::error::EncodeError;
use crate::value::{Arg, TypeTag, Value};
use bytes::BytesMut;

/// Names a procedure and declares the ordered list of parameter type tags.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub param_types: Vec<TypeTag>,
}

impl Procedure {
    pub fn new(name: impl Into<String>, param_types: Vec<TypeTag>) -> Self {
        Self { name: name.into(), param_types }
    }

    /// Serialize the call payload: version byte, name, client handle,
    /// parameter count, then each parameter either as a self-describing
    /// array envelope or a wire-type-prefixed scalar.
    ///
    /// `args.len()` must equal `self.param_types.len()`; each argument's
    /// shape (scalar vs. array) must match its declared parameter type.
    pub fn serialize_call(&self, handle: i64, args: &[Arg]) -> Result<BytesMut, EncodeError> {
        if args.len() != self.param_types.len() {
            return Err(EncodeError::TypeMismatch("argument count does not match declared parameter count"));
        }

        let mut buf = BytesMut::new();
        scalar::write_byte(&mut buf, 0); // version
        scalar::write_string(&mut buf, Some(&self.name));
        buf.extend_from_slice(&handle.to_be_bytes());
        buf.extend_from_slice(&(self.param_types.len() as i16).to_be_bytes());

        for (arg, declared) in args.iter().zip(self.param_types.iter()) {
            arg.check_declared(*declared)?;
            match arg {
                Arg::Array(elem_tag, values) => {
                    array::write_array_envelope(&mut buf, *elem_tag, values)?;
                }
                Arg::Scalar(value) => {
                    scalar::write_byte(&mut buf, declared.as_i8() as u8);
                    write_scalar_or_null(&mut buf, *declared, value)?;
                }
            }
        }

        Ok(buf)
    }
}

fn write_scalar_or_null(buf: &mut BytesMut, declared: TypeTag, value: &Value) -> Result<(), EncodeError> {
    if matches!(value, Value::Null) {
        crate::codec::write_null(buf, declared);
        return Ok(());
    }
    // DECIMAL_STRING reuses DECIMAL's Value representation but serializes
    // as an ASCII string (§3/§4.1), not the 16-byte binary layout
    // `write_value` would otherwise pick for a `Value::Decimal`.
    if declared == TypeTag::DecimalString {
        let Value::Decimal(d) = value else {
            return Err(EncodeError::TypeMismatch(
                "DECIMAL_STRING parameter requires a Decimal argument",
            ));
        };
        let fixed = decimal::Decimal::from_rust_decimal(*d)?;
        decimal::write_decimal_string(buf, Some(&fixed));
        return Ok(());
    }
    write_value(buf, value)
}

/// Wrap an outgoing call payload in its length prefix, per the universal
/// `int32 length | payload` post-handshake frame shape.
pub fn frame(payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as i32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Reader;

    #[test]
    fn serializes_name_handle_and_scalar_params() {
        let proc = Procedure::new("Insert", vec![TypeTag::Str, TypeTag::Str, TypeTag::Str]);
        let args = vec![Arg::from("English"), Arg::from("Hello"), Arg::from("World")];
        let payload = proc.serialize_call(7, &args).unwrap();

        let mut r = Reader::new(&payload);
        assert_eq!(scalar::read_byte(&mut r).unwrap(), 0); // version
        assert_eq!(scalar::read_string(&mut r).unwrap(), Some("Insert".to_string()));
        assert_eq!(scalar::read_raw_i64(&mut r).unwrap(), 7);
        assert_eq!(scalar::read_raw_i16(&mut r).unwrap(), 3);
    }

    #[test]
    fn rejects_scalar_argument_for_array_parameter() {
        let proc = Procedure::new("Foo", vec![TypeTag::Array]);
        let args = vec![Arg::from(1i32)];
        assert!(proc.serialize_call(1, &args).is_err());
    }

    #[test]
    fn rejects_wrong_argument_count() {
        let proc = Procedure::new("Foo", vec![TypeTag::Integer, TypeTag::Integer]);
        let args = vec![Arg::from(1i32)];
        assert!(proc.serialize_call(1, &args).is_err());
    }

    #[test]
    fn decimal_string_parameter_serializes_as_ascii_not_binary() {
        let proc = Procedure::new("Foo", vec![TypeTag::DecimalString]);
        let d: rust_decimal::Decimal = "12345.678901234".parse().unwrap();
        let args = vec![Arg::from(d)];
        let payload = proc.serialize_call(1, &args).unwrap();

        let mut r = Reader::new(&payload);
        let _version = scalar::read_byte(&mut r).unwrap();
        let _name = scalar::read_string(&mut r).unwrap();
        let _handle = scalar::read_raw_i64(&mut r).unwrap();
        let _param_count = scalar::read_raw_i16(&mut r).unwrap();
        let tag = scalar::read_byte(&mut r).unwrap();
        assert_eq!(tag as i8, TypeTag::DecimalString.as_i8());
        // A DECIMAL_STRING value is the string codec's int32 length prefix
        // followed by ASCII digits, not a 16-byte binary decimal.
        assert_eq!(scalar::read_string(&mut r).unwrap(), Some("12345.678901234000".to_string()));
    }

    #[test]
    fn decimal_string_parameter_rejects_non_decimal_argument() {
        let proc = Procedure::new("Foo", vec![TypeTag::DecimalString]);
        let args = vec![Arg::from(1i32)];
        assert!(proc.serialize_call(1, &args).is_err());
    }
}
