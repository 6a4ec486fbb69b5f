//! The login handshake that precedes ordinary call traffic.
//!
//! Unlike every later frame, the login request and response are not
//! length-prefixed length-verified in the usual codec sense: the request
//! carries its own int32 length (of everything after the length field
//! itself) and the response must be read to its full advertised length
//! before it can be parsed, but neither side goes through
//! [`crate::codec::table::Table`] or any other composite decoder. It is
//! simple enough to hand-roll here rather than stretch the general
//! [`crate::codec`] machinery to cover a one-shot exchange.

use bytes::{BufMut, BytesMut};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::VoltError;

/// Fields the server returns after a successful login that this client has
/// no use for beyond confirming the frame parses to completion. The
/// trailing int32-prefixed list of int32 values (per-host build/version
/// info in the real server) is read and discarded entirely, since it is
/// server metadata the client never needs.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub host_id: i32,
    pub connection_id: i64,
    pub cluster_start_time: i64,
    pub leader_address: i32,
}

fn hash_password(password: &str) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn write_length_prefixed_string(buf: &mut BytesMut, s: &str) {
    buf.put_i32(s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

/// Send the login request and block until the server accepts or rejects it.
pub async fn perform(stream: &mut TcpStream, username: &str, password: &str) -> Result<LoginResult, VoltError> {
    let mut body = BytesMut::new();
    body.put_u8(0); // protocol version
    write_length_prefixed_string(&mut body, "database");
    write_length_prefixed_string(&mut body, username);
    body.extend_from_slice(&hash_password(password));

    let mut frame = BytesMut::with_capacity(4 + body.len());
    frame.put_i32(body.len() as i32);
    frame.extend_from_slice(&body);
    stream.write_all(&frame).await?;
    stream.flush().await?;

    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await?;
    let len = i32::from_be_bytes(len_bytes).max(0) as usize;

    let mut response = vec![0u8; len];
    stream.read_exact(&mut response).await?;

    let mut r = crate::codec::Reader::new(&response);
    let _version = crate::codec::scalar::read_byte(&mut r)?;
    let status = crate::codec::scalar::read_byte(&mut r)?;
    if status != 0 {
        return Err(VoltError::AuthFailed { status });
    }

    let host_id = crate::codec::scalar::read_raw_i32(&mut r)?;
    let connection_id = crate::codec::scalar::read_raw_i64(&mut r)?;
    let cluster_start_time = crate::codec::scalar::read_raw_i64(&mut r)?;
    let leader_address = crate::codec::scalar::read_raw_i32(&mut r)?;
    let trailing_count = crate::codec::scalar::read_raw_i32(&mut r)?.max(0) as usize;
    for _ in 0..trailing_count {
        let _ = crate::codec::scalar::read_raw_i32(&mut r)?;
    }

    Ok(LoginResult { host_id, connection_id, cluster_start_time, leader_address })
}
