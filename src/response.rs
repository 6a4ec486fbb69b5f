//! Decoding a completed call's response: status, optional diagnostic
//! strings, the server exception (if any), and the list of result tables.

use crate::codec::scalar::{read_byte, read_raw_i16, read_raw_i32, read_raw_i64, read_string};
use crate::codec::{exception, Reader, ServerException, Table};
use crate::error::DecodeError;

/// Bit positions within the response's "present fields" bitmask byte.
mod present {
    pub const STATUS_STRING: u8 = 1 << 5;
    pub const EXCEPTION: u8 = 1 << 6;
    pub const APP_STATUS_STRING: u8 = 1 << 7;
}

/// A decoded call response, correlated back to its caller by `handle`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    pub handle: i64,
    pub status: i8,
    pub status_string: Option<String>,
    pub app_status: i8,
    pub app_status_string: Option<String>,
    pub round_trip_time_ms: i32,
    pub exception: ServerException,
    pub tables: Vec<Table>,
}

/// The protocol-level success status. The server defines other status
/// codes for retriable and non-retriable failures, but does not assign any
/// of them applicationwide meaning beyond "not `PROC_OK`"; callers that need
/// finer dispatch inspect `status` directly.
pub const PROC_OK: i8 = 0;

impl CallResponse {
    pub fn decode(r: &mut Reader) -> Result<Self, DecodeError> {
        let _version = read_byte(r)?;
        let handle = read_raw_i64(r)?;
        let present_fields = read_byte(r)?;
        let status = read_byte(r)? as i8;

        let status_string = if present_fields & present::STATUS_STRING != 0 {
            read_string(r)?
        } else {
            None
        };

        let app_status = read_byte(r)? as i8;

        let app_status_string = if present_fields & present::APP_STATUS_STRING != 0 {
            read_string(r)?
        } else {
            None
        };

        let round_trip_time_ms = read_raw_i32(r)?;

        let exception = if present_fields & present::EXCEPTION != 0 {
            exception::read_exception(r)?
        } else {
            ServerException::None
        };

        let table_count = read_raw_i16(r)? as usize;
        let mut tables = Vec::with_capacity(table_count);
        for _ in 0..table_count {
            tables.push(Table::decode(r)?);
        }

        Ok(Self {
            handle,
            status,
            status_string,
            app_status,
            app_status_string,
            round_trip_time_ms,
            exception,
            tables,
        })
    }

    /// True if `status` is the protocol's success code. Convenience only;
    /// callers that care about specific failure codes should match on
    /// `status` directly rather than rely on this.
    pub fn is_ok(&self) -> bool {
        self.status == PROC_OK
    }
}

impl std::fmt::Display for CallResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        if let Some(s) = &self.status_string {
            writeln!(f, "Status string: {s}")?;
        }
        if self.exception != ServerException::None {
            writeln!(f, "Exception: {:?}", self.exception)?;
        }
        for table in &self.tables {
            writeln!(f, "{table}")?;
        }
        Ok(())
    }
}
