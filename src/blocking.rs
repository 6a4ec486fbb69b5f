//! A synchronous facade over [`crate::connection::Connection`] for callers
//! that have no async runtime of their own. Each call blocks the calling
//! thread until a response arrives; concurrency across handles still
//! happens underneath, just invisibly to this API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::VoltResult;
use crate::procedure::Procedure;
use crate::response::CallResponse;
use crate::value::Arg;

/// Wraps a [`Connection`] and a dedicated current-thread runtime used only
/// to drive it. Dropping this drops the runtime, which in turn drops the
/// connection's reactor tasks.
pub struct BlockingConnection {
    connection: Connection,
    runtime: tokio::runtime::Runtime,
}

impl BlockingConnection {
    pub fn connect(config: ConnectionConfig) -> VoltResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to start current-thread runtime for blocking volt connection");
        let connection = runtime.block_on(Connection::connect(config))?;
        Ok(Self { connection, runtime })
    }

    /// Invoke a procedure and block until its response arrives.
    pub fn call(&self, procedure: &Procedure, args: &[Arg]) -> VoltResult<CallResponse> {
        self.runtime.block_on(self.connection.call(procedure, args))
    }

    pub fn frames_sent(&self) -> u64 {
        self.connection.frames_sent()
    }

    pub fn close(&self) {
        self.connection.close();
    }
}
