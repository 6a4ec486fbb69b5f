//! In-process mock server exercising the connection engine's concurrency,
//! backpressure, and shutdown behavior without a real database.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use voltproto::codec::scalar::{read_raw_i64, read_string, write_byte};
use voltproto::codec::Reader;
use voltproto::{Arg, Connection, ConnectionConfig, Procedure, TypeTag, VoltError, MAX_OUTSTANDING_CALLS};

fn login_accept_bytes() -> BytesMut {
    let mut body = BytesMut::new();
    write_byte(&mut body, 0); // version
    write_byte(&mut body, 0); // status: ok
    body.put_i32(0); // host_id
    body.put_i64(1); // connection_id
    body.put_i64(0); // cluster_start_time
    body.put_i32(0); // leader_address
    body.put_i32(0); // trailing int32 list count
    frame(&body)
}

fn login_reject_bytes() -> BytesMut {
    let mut body = BytesMut::new();
    write_byte(&mut body, 0);
    write_byte(&mut body, 1); // status: failed
    frame(&body)
}

fn frame(body: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(4 + body.len());
    out.put_i32(body.len() as i32);
    out.extend_from_slice(body);
    out
}

/// Read one incoming call frame and return its client handle. The payload
/// shape is fixed: version(1) + string(name) + handle(i64) + ...
async fn read_call_handle(stream: &mut TcpStream) -> i64 {
    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await.unwrap();
    let len = i32::from_be_bytes(len_bytes) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await.unwrap();

    let mut r = Reader::new(&body);
    let _version = voltproto::codec::scalar::read_byte(&mut r).unwrap();
    let _name = read_string(&mut r).unwrap();
    read_raw_i64(&mut r).unwrap()
}

/// Build a minimal success response frame for `handle` with zero tables.
fn ok_response_bytes(handle: i64) -> BytesMut {
    let mut body = BytesMut::new();
    write_byte(&mut body, 0); // version
    body.extend_from_slice(&handle.to_be_bytes());
    write_byte(&mut body, 0); // present_fields: none
    write_byte(&mut body, 0); // status: PROC_OK
    write_byte(&mut body, 0); // app_status
    body.put_i32(1); // round trip time
    body.put_i16(0); // table_count
    frame(&body)
}

async fn start_accepting_server() -> (std::net::SocketAddr, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, listener)
}

#[tokio::test]
async fn handles_are_demultiplexed_out_of_order() {
    let (addr, listener) = start_accepting_server().await;

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&login_accept_bytes()).await.unwrap();

        let first_handle = read_call_handle(&mut stream).await;
        let second_handle = read_call_handle(&mut stream).await;

        // Respond out of order: second call's response arrives first.
        stream.write_all(&ok_response_bytes(second_handle)).await.unwrap();
        stream.write_all(&ok_response_bytes(first_handle)).await.unwrap();
    });

    let config = ConnectionConfig::builder(addr.ip().to_string(), addr.port()).build();
    let conn = Connection::connect(config).await.unwrap();

    let echo = Procedure::new("Echo", vec![TypeTag::Integer]);
    let conn_a = conn.clone();
    let conn_b = conn.clone();
    let call_a = tokio::spawn(async move { conn_a.call(&echo, &[Arg::from(1i32)]).await });
    let echo2 = Procedure::new("Echo", vec![TypeTag::Integer]);
    let call_b = tokio::spawn(async move { conn_b.call(&echo2, &[Arg::from(2i32)]).await });

    let (res_a, res_b) = tokio::join!(call_a, call_b);
    assert!(res_a.unwrap().is_ok());
    assert!(res_b.unwrap().is_ok());

    server.await.unwrap();
}

#[tokio::test]
async fn backpressure_rejects_the_call_beyond_the_limit() {
    let (addr, listener) = start_accepting_server().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&login_accept_bytes()).await.unwrap();
        // Never respond to any call: every call stays outstanding forever.
        let mut sink = vec![0u8; 1 << 20];
        loop {
            match stream.read(&mut sink).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let config = ConnectionConfig::builder(addr.ip().to_string(), addr.port()).build();
    let conn = Connection::connect(config).await.unwrap();
    let echo = Procedure::new("Echo", vec![TypeTag::Integer]);

    let mut pending = Vec::new();
    for i in 0..MAX_OUTSTANDING_CALLS {
        let conn = conn.clone();
        let proc = echo.clone();
        pending.push(tokio::spawn(async move { conn.call(&proc, &[Arg::from(i as i32)]).await }));
    }
    // Give every spawned call a chance to register itself before probing
    // the boundary; the map insert happens synchronously inside `call`
    // before the await point, so a brief yield is enough.
    tokio::task::yield_now().await;

    let result = conn.call(&echo, &[Arg::from(999i32)]).await;
    assert!(matches!(result, Err(VoltError::Backpressure)));

    for handle in pending {
        handle.abort();
    }
}

#[tokio::test]
async fn close_fails_all_pending_calls() {
    let (addr, listener) = start_accepting_server().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&login_accept_bytes()).await.unwrap();
        let _handle = read_call_handle(&mut stream).await;
        // Never respond; just hold the connection open until the test ends.
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    });

    let config = ConnectionConfig::builder(addr.ip().to_string(), addr.port()).build();
    let conn = Connection::connect(config).await.unwrap();
    let echo = Procedure::new("Echo", vec![TypeTag::Integer]);

    let conn2 = conn.clone();
    let call = tokio::spawn(async move { conn2.call(&echo, &[Arg::from(1i32)]).await });
    tokio::task::yield_now().await;

    conn.close();
    let result = call.await.unwrap();
    assert!(matches!(result, Err(VoltError::ConnectionClosed)));
}

#[tokio::test]
async fn nonzero_auth_status_fails_connect() {
    let (addr, listener) = start_accepting_server().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&login_reject_bytes()).await.unwrap();
    });

    let config = ConnectionConfig::builder(addr.ip().to_string(), addr.port()).build();
    let result = Connection::connect(config).await;
    assert!(matches!(result, Err(VoltError::AuthFailed { status: 1 })));
}
