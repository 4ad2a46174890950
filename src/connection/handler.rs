// src/connection/handler.rs

//! Drives one TCP connection: decode frames, parse commands, dispatch
//! against shared state, write replies. `PSYNC` is intercepted before
//! reaching the dispatcher because completing it means splitting the
//! socket into independent read/write halves (see §4.3, §4.5 of the
//! design notes) so that propagation from other connections can write
//! into this replica's socket concurrently with this task's own reads.

use crate::core::command::{self, Command};
use crate::core::context::ServerState;
use crate::core::dispatcher;
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::replication::{ReplicaHandle, Role};
use crate::core::KvNodeError;
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Framed, FramedParts};
use tracing::{debug, info, warn};

/// Drives a freshly-accepted client connection: parses and dispatches
/// commands in arrival order, writing replies in the same order.
pub async fn serve_client(stream: TcpStream, addr: SocketAddr, state: Arc<ServerState>) {
    if let Err(e) = run(stream, addr, state, BytesMut::new(), false).await {
        warn!(%addr, error = %e, "connection terminated");
    }
}

/// Drives the replica's single long-lived connection to its upstream
/// master, after the handshake has completed. `leftover` holds any bytes
/// already read past the RDB payload during the handshake — the start of
/// the first propagated command — and must be fed back into the decoder
/// rather than discarded. Replies are suppressed on this connection except
/// for `REPLCONF GETACK *` (see §4.5).
pub async fn serve_master_link(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
    leftover: BytesMut,
) {
    if let Err(e) = run(stream, addr, state, leftover, true).await {
        warn!(%addr, error = %e, "replication link to master terminated");
    }
}

async fn run(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
    leftover: BytesMut,
    suppress_replies: bool,
) -> Result<(), KvNodeError> {
    let mut parts = FramedParts::new(stream, RespFrameCodec::default());
    parts.read_buf = leftover;
    let mut framed = Framed::from_parts(parts);

    loop {
        let Some(decoded) = framed.next().await else {
            debug!(%addr, "connection closed by peer");
            return Ok(());
        };
        let (frame, raw) = match decoded {
            Ok(pair) => pair,
            Err(e) => {
                debug!(%addr, error = %e, "malformed frame dropped");
                continue;
            }
        };

        let cmd = match command::parse(&frame) {
            Ok(cmd) => cmd,
            Err(e) => {
                if !suppress_replies {
                    framed.send(RespFrame::Error(e.as_reply_message())).await?;
                }
                continue;
            }
        };

        if cmd == Command::Psync {
            return handle_psync(framed, addr, &state).await;
        }

        match dispatcher::dispatch(&cmd, &raw, &state).await {
            Ok(Some(reply)) => {
                if matches!(cmd, Command::ReplconfGetAck) || !suppress_replies {
                    framed.send(reply).await?;
                }
            }
            Ok(None) => {}
            Err(e) => {
                if !suppress_replies {
                    framed.send(RespFrame::Error(e.as_reply_message())).await?;
                }
            }
        }
    }
}

/// Completes the master-side PSYNC handshake for an incoming replica, then
/// keeps servicing that connection's reads (replica-sourced `REPLCONF ACK`
/// frames) for as long as it stays open.
async fn handle_psync(
    framed: Framed<TcpStream, RespFrameCodec>,
    addr: SocketAddr,
    state: &ServerState,
) -> Result<(), KvNodeError> {
    let Role::Master(master) = &state.role else {
        warn!(%addr, "PSYNC received but this instance is not a master");
        return Err(KvNodeError::BadRequest);
    };

    let parts = framed.into_parts();
    let leftover = parts.read_buf;
    let (read_half, write_half) = parts.io.into_split();
    let handle = ReplicaHandle::new(addr, write_half);

    // 1. FULLRESYNC reply.
    handle
        .write_all(format!("+FULLRESYNC {} 0\r\n", master.replid).as_bytes())
        .await?;

    // 2. RDB transfer: `$<len>\r\n<bytes>`, no trailing CRLF.
    handle
        .write_all(format!("${}\r\n", state.rdb_snapshot.len()).as_bytes())
        .await?;
    handle.write_all(&state.rdb_snapshot).await?;

    // 3-4. Register, then replay the write log accumulated up to (and
    // including) registration — done under one lock in `register_replica`
    // so no write can land in the gap between snapshot and registration.
    let backlog = master.register_replica(handle.clone());
    info!(%addr, backlog_len = backlog.len(), "replica completed PSYNC handshake");
    for entry in backlog {
        handle.write_all(&entry).await?;
    }

    // 5. REPLCONF GETACK *.
    let getack = RespFrame::Array(vec![
        RespFrame::BulkString(Bytes::from_static(b"REPLCONF")),
        RespFrame::BulkString(Bytes::from_static(b"GETACK")),
        RespFrame::BulkString(Bytes::from_static(b"*")),
    ]);
    handle.write_all(&getack.encode_to_vec()?).await?;

    let result = ingest_replica_frames(read_half, leftover, state, addr).await;
    master.deregister_replica(addr);
    info!(%addr, "replica connection closed, deregistered");
    result
}

/// After hand-off, the master only cares about further frames from the
/// replica for logging purposes — `REPLCONF ACK` replies with nothing
/// (`Command::ReplconfAck` dispatches to `Ok(None)`), and nothing else is
/// expected on this direction of the socket.
async fn ingest_replica_frames(
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    mut buf: BytesMut,
    state: &ServerState,
    addr: SocketAddr,
) -> Result<(), KvNodeError> {
    let mut codec = RespFrameCodec::default();
    loop {
        loop {
            match codec.decode(&mut buf) {
                Ok(Some((frame, raw))) => {
                    if let Ok(cmd) = command::parse(&frame) {
                        let _ = dispatcher::dispatch(&cmd, &raw, state).await;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(%addr, error = %e, "malformed frame from replica dropped");
                    break;
                }
            }
        }

        let mut tmp = [0u8; 4096];
        let n = read_half.read(&mut tmp).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}
