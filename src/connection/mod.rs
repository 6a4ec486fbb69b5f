//! The async connection engine: a login handshake followed by a pair of
//! cooperating tasks (reader, writer) that let many concurrent callers
//! share one TCP socket, each call tracked by a 64-bit handle and resolved
//! independently of call order.

mod handshake;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::codec::Reader;
use crate::error::{VoltError, VoltResult};
use crate::procedure::Procedure;
use crate::response::CallResponse;
use crate::value::Arg;

/// The number of outstanding (sent, not yet responded-to) calls beyond
/// which new calls are rejected rather than queued indefinitely.
pub const MAX_OUTSTANDING_CALLS: usize = 3000;

/// Connection parameters, built incrementally and consumed by [`Connection::connect`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl ConnectionConfig {
    pub fn builder(host: impl Into<String>, port: u16) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Builds a [`ConnectionConfig`]. Username and password default to empty,
/// matching the protocol's "authentication turned off" path, which still
/// requires the length-prefixed fields and a 20-byte password hash.
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl ConnectionConfigBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn build(self) -> ConnectionConfig {
        ConnectionConfig { host: self.host, port: self.port, username: self.username, password: self.password }
    }
}

type PendingMap = Mutex<HashMap<i64, oneshot::Sender<CallResponse>>>;

struct Inner {
    next_handle: AtomicI64,
    pending: PendingMap,
    write_tx: mpsc::UnboundedSender<BytesMut>,
    closed: AtomicBool,
    frames_sent: AtomicU64,
    reader_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    writer_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// A live connection to one server. Cheap to clone: clones share the same
/// underlying socket and reactor tasks, so a single `Connection` can be
/// handed to any number of concurrent callers.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    pub async fn connect(config: ConnectionConfig) -> VoltResult<Self> {
        let mut stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(VoltError::ConnectFailed)?;

        let login = handshake::perform(&mut stream, &config.username, &config.password).await?;
        debug!(connection_id = login.connection_id, host_id = login.host_id, "volt login accepted");

        let (read_half, write_half) = stream.into_split();
        let (write_tx, write_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            next_handle: AtomicI64::new(0),
            pending: Mutex::new(HashMap::new()),
            write_tx,
            closed: AtomicBool::new(false),
            frames_sent: AtomicU64::new(0),
            reader_handle: Mutex::new(None),
            writer_handle: Mutex::new(None),
        });

        let writer_handle = tokio::spawn(writer_task(write_half, write_rx));
        let reader_handle = tokio::spawn(reader_task(read_half, Arc::clone(&inner)));
        *inner.writer_handle.lock().unwrap() = Some(writer_handle);
        *inner.reader_handle.lock().unwrap() = Some(reader_handle);

        Ok(Self { inner })
    }

    /// Invoke a procedure and await its response.
    ///
    /// Returns [`VoltError::Backpressure`] without consuming a handle if
    /// [`MAX_OUTSTANDING_CALLS`] calls are already in flight, and
    /// [`VoltError::ConnectionClosed`] if the connection has gone away
    /// either before or while this call was outstanding.
    pub async fn call(&self, procedure: &Procedure, args: &[Arg]) -> VoltResult<CallResponse> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(VoltError::ConnectionClosed);
        }

        let (tx, rx) = oneshot::channel();
        let handle = {
            let mut pending = self.inner.pending.lock().unwrap();
            if pending.len() >= MAX_OUTSTANDING_CALLS {
                return Err(VoltError::Backpressure);
            }
            let handle = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
            pending.insert(handle, tx);
            handle
        };

        let payload = procedure.serialize_call(handle, args).map_err(VoltError::Encode)?;
        let frame = crate::procedure::frame(&payload);

        if self.inner.write_tx.send(frame).is_err() {
            self.inner.pending.lock().unwrap().remove(&handle);
            return Err(VoltError::ConnectionClosed);
        }
        self.inner.frames_sent.fetch_add(1, Ordering::Relaxed);

        rx.await.map_err(|_| VoltError::ConnectionClosed)
    }

    /// Number of call frames written to the socket over this connection's
    /// lifetime. Exposed for diagnostics; not part of the wire protocol.
    pub fn frames_sent(&self) -> u64 {
        self.inner.frames_sent.load(Ordering::Relaxed)
    }

    /// Shut down the connection: stop accepting new writes, abort the
    /// reader and writer tasks so both halves of the socket drop and the
    /// OS closes it, and fail every call still waiting on a response.
    /// Safe to call more than once.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.inner.reader_handle.lock().unwrap().take() {
            handle.abort();
        }
        if let Some(handle) = self.inner.writer_handle.lock().unwrap().take() {
            handle.abort();
        }
        fail_all_pending(&self.inner.pending);
    }
}

fn fail_all_pending(pending: &PendingMap) {
    let mut map = pending.lock().unwrap();
    for (_, tx) in map.drain() {
        let _ = tx.send(CallResponse {
            handle: 0,
            status: -1,
            status_string: Some("connection closed".to_string()),
            app_status: -1,
            app_status_string: None,
            round_trip_time_ms: 0,
            exception: crate::codec::ServerException::None,
            tables: Vec::new(),
        });
    }
}

async fn writer_task(mut write_half: tokio::net::tcp::OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<BytesMut>) {
    while let Some(frame) = rx.recv().await {
        if let Err(err) = write_half.write_all(&frame).await {
            warn!(%err, "volt connection write failed, closing writer");
            break;
        }
        if write_half.flush().await.is_err() {
            break;
        }
    }
}

async fn reader_task(mut read_half: tokio::net::tcp::OwnedReadHalf, inner: Arc<Inner>) {
    loop {
        match read_one_response(&mut read_half).await {
            Ok(Some(response)) => {
                if let Err(err) = dispatch(&inner, response) {
                    // An orphan response means the peer answered a handle we
                    // are no longer tracking (already resolved, or never
                    // ours). The frame itself is fully consumed, so the
                    // stream stays aligned and the session survives.
                    warn!(%err, "volt received an orphan response");
                }
            }
            Ok(None) => {
                debug!("volt connection closed by peer");
                break;
            }
            Err(err) => {
                warn!(%err, "volt connection read failed, closing reactor");
                break;
            }
        }
    }
    inner.closed.store(true, Ordering::Release);
    fail_all_pending(&inner.pending);
}

/// Read one length-prefixed frame and decode it as a [`CallResponse`].
/// Returns `Ok(None)` on a clean EOF (zero-byte read at a frame boundary).
async fn read_one_response(read_half: &mut tokio::net::tcp::OwnedReadHalf) -> VoltResult<Option<CallResponse>> {
    let mut len_bytes = [0u8; 4];
    match read_half.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }
    let len = i32::from_be_bytes(len_bytes).max(0) as usize;

    let mut body = vec![0u8; len];
    read_half.read_exact(&mut body).await?;

    let mut r = Reader::new(&body);
    let response = CallResponse::decode(&mut r)?;
    Ok(Some(response))
}

fn dispatch(inner: &Arc<Inner>, response: CallResponse) -> Result<(), crate::error::DecodeError> {
    let sender = inner.pending.lock().unwrap().remove(&response.handle);
    match sender {
        Some(tx) => {
            let _ = tx.send(response);
            Ok(())
        }
        None => Err(crate::error::DecodeError::OrphanResponse(response.handle)),
    }
}
