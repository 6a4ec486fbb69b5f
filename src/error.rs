//! Error taxonomy for the wire protocol client.
//!
//! One top-level [`VoltError`] covers every way a session can fail; the two
//! data-shaped sub-errors ([`DecodeError`], [`EncodeError`]) nest inside it
//! rather than flattening their variants into the parent, so callers can
//! match on "decode went wrong" without enumerating every wire primitive.

use thiserror::Error;

/// Errors produced while turning wire bytes into typed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A STRING or DECIMAL_STRING field was not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    BadUtf8,
    /// A decimal's scale (digits right of the point) exceeds 12.
    #[error("decimal scale {0} exceeds the maximum of 12")]
    Scale(u32),
    /// A decimal's integer part exceeds 26 digits.
    #[error("decimal precision {0} exceeds the maximum of 26 integer digits")]
    Precision(u32),
    /// A nested length prefix did not match the bytes actually present.
    #[error("frame length mismatch: {context}")]
    Frame {
        /// What was being decoded when the mismatch was detected.
        context: &'static str,
    },
    /// A response's client handle had no matching pending call.
    #[error("response handle {0} has no pending call")]
    OrphanResponse(i64),
    /// A type tag byte did not match any known value domain.
    #[error("unknown wire type tag {0}")]
    UnknownTag(i8),
}

/// Errors produced while turning typed values into wire bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The caller's decimal has more than 12 digits after the point.
    #[error("decimal scale {0} exceeds the maximum of 12")]
    Scale(u32),
    /// The caller's decimal has more than 26 digits before the point.
    #[error("decimal precision {0} exceeds the maximum of 26 integer digits")]
    Precision(u32),
    /// An argument's runtime shape did not match its declared parameter type.
    #[error("argument does not match declared parameter type: {0}")]
    TypeMismatch(&'static str),
}

/// Errors emitted by the connection engine and blocking facade.
#[derive(Debug, Error)]
pub enum VoltError {
    /// The TCP connection could not be established.
    #[error("failed to connect: {0}")]
    ConnectFailed(#[source] std::io::Error),
    /// The login handshake completed with a nonzero status byte.
    #[error("authentication failed (status {status})")]
    AuthFailed {
        /// The status byte the server replied with.
        status: u8,
    },
    /// The connection was closed, either by the caller or by the peer.
    #[error("connection closed")]
    ConnectionClosed,
    /// The engine already has 3,000 outstanding calls; retry later.
    #[error("backpressure: 3000 calls already outstanding")]
    Backpressure,
    /// Malformed data was read from the socket; the connection is no longer usable.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// The caller supplied an argument that cannot be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    /// The server accepted the call but reported a nonzero status.
    #[error("procedure failed: status {status}: {message}")]
    ProcedureFailure {
        /// Verbatim status byte from the response.
        status: i8,
        /// Verbatim status string from the response, if present.
        message: String,
    },
    /// Low-level I/O failure not covered by a more specific variant.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type VoltResult<T> = Result<T, VoltError>;
