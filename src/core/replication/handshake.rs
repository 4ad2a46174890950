// src/core/replication/handshake.rs

//! The replica side of the PSYNC handshake: a single linear sequence with
//! no retries. Each step waits for any reply before proceeding; reply
//! content is not validated beyond its presence, matching the source's own
//! simplification here (a production replication client would retry with
//! backoff; this one does not, by design — see the design notes).

use crate::core::KvNodeError;
use crate::core::protocol::RespFrame;
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Result of a completed handshake: the socket (ready to be handed to the
/// ordinary per-connection loop) and any bytes already read past the RDB
/// payload, which belong to the first propagated command and must not be
/// dropped.
pub struct HandshakeOutcome {
    pub stream: TcpStream,
    pub leftover: BytesMut,
}

/// Runs the replica-side handshake against `host:port`, advertising
/// `own_port` via REPLCONF LISTENING-PORT. Any I/O failure aborts the
/// attempt; the caller treats that as a fatal startup error.
pub async fn run(host: &str, port: u16, own_port: u16) -> Result<HandshakeOutcome, KvNodeError> {
    let mut stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| KvNodeError::Replication(format!("connect to {host}:{port} failed: {e}")))?;
    let mut buf = BytesMut::new();

    info!(%host, port, "starting replication handshake with master");

    send_array(&mut stream, &["PING"]).await?;
    read_line(&mut stream, &mut buf).await?;

    send_array(&mut stream, &["REPLCONF", "listening-port", &own_port.to_string()]).await?;
    read_line(&mut stream, &mut buf).await?;

    send_array(&mut stream, &["REPLCONF", "capa", "psync2"]).await?;
    read_line(&mut stream, &mut buf).await?;

    send_array(&mut stream, &["PSYNC", "?", "-1"]).await?;
    let fullresync_line = read_line(&mut stream, &mut buf).await?;
    debug!(reply = %String::from_utf8_lossy(&fullresync_line), "received FULLRESYNC reply");

    read_rdb_payload(&mut stream, &mut buf).await?;
    info!("handshake complete, entering streaming mode");

    Ok(HandshakeOutcome { stream, leftover: buf })
}

async fn send_array(stream: &mut TcpStream, parts: &[&str]) -> Result<(), KvNodeError> {
    let frame = RespFrame::Array(
        parts
            .iter()
            .map(|p| RespFrame::BulkString(Bytes::copy_from_slice(p.as_bytes())))
            .collect(),
    );
    let bytes = frame.encode_to_vec()?;
    stream.write_all(&bytes).await.map_err(KvNodeError::from)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Reads and consumes the next CRLF-terminated line from `stream`,
/// buffering in `buf` across partial reads. Returns the line without the
/// trailing CRLF.
async fn read_line(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<Bytes, KvNodeError> {
    loop {
        if let Some(pos) = find_crlf(buf) {
            let line = buf.split_to(pos).freeze();
            buf.advance(2);
            return Ok(line);
        }
        let mut tmp = [0u8; 4096];
        let n = stream
            .read(&mut tmp)
            .await
            .map_err(KvNodeError::from)?;
        if n == 0 {
            return Err(KvNodeError::Replication(
                "master closed connection during handshake".to_string(),
            ));
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}

/// Reads the `$<len>\r\n<bytes>` RDB transfer frame. Unlike a bulk string
/// there is no trailing CRLF after the payload bytes.
async fn read_rdb_payload(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<Bytes, KvNodeError> {
    let header = read_line(stream, buf).await?;
    if header.first() != Some(&b'$') {
        return Err(KvNodeError::Replication(
            "expected RDB transfer header".to_string(),
        ));
    }
    let len: usize = std::str::from_utf8(&header[1..])
        .map_err(|_| KvNodeError::Replication("invalid RDB transfer length".to_string()))?
        .parse()
        .map_err(|_| KvNodeError::Replication("invalid RDB transfer length".to_string()))?;

    while buf.len() < len {
        let mut tmp = [0u8; 4096];
        let n = stream.read(&mut tmp).await.map_err(KvNodeError::from)?;
        if n == 0 {
            return Err(KvNodeError::Replication(
                "master closed connection mid-RDB-transfer".to_string(),
            ));
        }
        buf.extend_from_slice(&tmp[..n]);
    }
    Ok(buf.split_to(len).freeze())
}
