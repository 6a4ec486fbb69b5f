//! # voltproto
//!
//! An async client for a VoltDB-style distributed SQL database: a bit-exact
//! binary wire codec plus a connection engine that multiplexes many
//! concurrent procedure calls over one socket.
//!
//! ## Architecture
//!
//! ```text
//! Procedure + [Arg] → codec::write_value → BytesMut → TCP → server
//! server → TCP → BytesMut → codec::read_value → CallResponse
//! ```
//!
//! ### Layer 1: Codec (pure, sync)
//! - `codec` - scalar, array, decimal, table and exception wire formats
//! - No async, no I/O: a [`codec::Reader`] walks bytes in, writers append
//!   to a `bytes::BytesMut`
//!
//! ### Layer 2: Connection (async I/O)
//! - `connection::Connection` - login handshake, handle-multiplexed calls,
//!   3000-call backpressure
//! - `blocking::BlockingConnection` - synchronous facade for callers
//!   without their own async runtime
//!
//! ## Example
//!
//! ```ignore
//! use voltproto::{Connection, ConnectionConfig, Procedure, Arg, TypeTag};
//!
//! let config = ConnectionConfig::builder("localhost", 21212).build();
//! let conn = Connection::connect(config).await?;
//!
//! let insert = Procedure::new("Insert", vec![TypeTag::Str, TypeTag::Str, TypeTag::Str]);
//! let response = conn.call(&insert, &[Arg::from("English"), Arg::from("Hello"), Arg::from("World")]).await?;
//! assert!(response.is_ok());
//! ```

pub mod blocking;
pub mod codec;
pub mod connection;
pub mod error;
pub mod procedure;
pub mod response;
pub mod value;

pub use blocking::BlockingConnection;
pub use codec::{ColumnDescriptor, ServerException, Table};
pub use connection::{Connection, ConnectionConfig, ConnectionConfigBuilder, MAX_OUTSTANDING_CALLS};
pub use error::{DecodeError, EncodeError, VoltError, VoltResult};
pub use procedure::Procedure;
pub use response::{CallResponse, PROC_OK};
pub use value::{Arg, TypeTag, Value};
