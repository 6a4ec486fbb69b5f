//! The server exception that may ride along with a call response.
//!
//! On the wire this is a length-prefixed block: if the length is zero
//! there is no exception at all. Otherwise a type byte selects one of a
//! closed set of variants, each carrying a message and, for the more
//! specific variants, extra fields (an EE error code, a 5-byte SQL state,
//! or a constraint violation's table name and opaque payload).

use super::Reader;
use super::scalar::{read_byte, read_raw_i32, read_string};
use crate::error::DecodeError;

/// A server-reported exception, closed over the kinds this protocol defines.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerException {
    None,
    Generic { message: String },
    Ee { message: String, error_code: i32 },
    Sql { message: String, sql_state: [u8; 5] },
    ConstraintFailure {
        message: String,
        sql_state: [u8; 5],
        constraint_type: i32,
        table_name: String,
        payload: Vec<u8>,
    },
}

fn read_sql_state(r: &mut Reader) -> Result<[u8; 5], DecodeError> {
    let bytes = r.take(5, "sql state")?;
    let mut out = [0u8; 5];
    out.copy_from_slice(bytes);
    Ok(out)
}

pub fn read_exception(r: &mut Reader) -> Result<ServerException, DecodeError> {
    let length = read_raw_i32(r)?;
    if length == 0 {
        return Ok(ServerException::None);
    }

    let type_byte = read_byte(r)?;
    if type_byte == 0 {
        return Ok(ServerException::None);
    }

    let message_len = read_raw_i32(r)?;
    let message_bytes = r.take(message_len.max(0) as usize, "exception message")?;
    let message = String::from_utf8_lossy(message_bytes).into_owned();

    Ok(match type_byte {
        4 => ServerException::Generic { message },
        1 => {
            let error_code = read_raw_i32(r)?;
            ServerException::Ee { message, error_code }
        }
        2 => {
            let sql_state = read_sql_state(r)?;
            ServerException::Sql { message, sql_state }
        }
        3 => {
            let sql_state = read_sql_state(r)?;
            let constraint_type = read_raw_i32(r)?;
            let table_name = read_string(r)?.unwrap_or_default();
            let payload_size = read_raw_i32(r)?;
            let payload = r.take(payload_size.max(0) as usize, "constraint failure payload")?.to_vec();
            ServerException::ConstraintFailure { message, sql_state, constraint_type, table_name, payload }
        }
        other => return Err(DecodeError::UnknownTag(other as i8)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    #[test]
    fn zero_length_is_none() {
        let mut buf = BytesMut::new();
        buf.put_i32(0);
        let mut r = Reader::new(&buf);
        assert_eq!(read_exception(&mut r).unwrap(), ServerException::None);
    }

    #[test]
    fn generic_exception_carries_message() {
        let mut buf = BytesMut::new();
        let message = b"constraint violated";
        // length: type(1) + message_len(4) + message
        buf.put_i32(1 + 4 + message.len() as i32);
        buf.put_u8(4); // GENERIC
        buf.put_i32(message.len() as i32);
        buf.extend_from_slice(message);

        let mut r = Reader::new(&buf);
        let exc = read_exception(&mut r).unwrap();
        assert_eq!(exc, ServerException::Generic { message: "constraint violated".to_string() });
    }

    #[test]
    fn ee_exception_carries_error_code() {
        let mut buf = BytesMut::new();
        buf.put_i32(1 + 4 + 0 + 4);
        buf.put_u8(1); // EE
        buf.put_i32(0); // empty message
        buf.put_i32(42);

        let mut r = Reader::new(&buf);
        let exc = read_exception(&mut r).unwrap();
        assert_eq!(exc, ServerException::Ee { message: String::new(), error_code: 42 });
    }
}
