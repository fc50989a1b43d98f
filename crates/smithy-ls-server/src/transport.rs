//! JSON-RPC framing over stdio or a TCP socket.

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::protocol::Incoming;

/// Serve LSP over stdin/stdout. Returns the process exit code.
pub async fn serve_stdio(dispatcher: Dispatcher) -> Result<i32> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    info!("serving on stdio");
    pump(dispatcher, stdin, stdout).await
}

/// Serve LSP over a single TCP connection on `port`.
pub async fn serve_tcp(dispatcher: Dispatcher, port: u16) -> Result<i32> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("cannot bind 127.0.0.1:{port}"))?;
    info!(port, "waiting for a client connection");
    let (socket, peer) = listener.accept().await.context("accept failed")?;
    info!(%peer, "client connected");
    let (read, write) = socket.into_split();
    pump(dispatcher, BufReader::new(read), write).await
}

/// The message pump: read framed messages, dispatch them in order,
/// write the response and any notifications back.
async fn pump<R, W>(dispatcher: Dispatcher, mut reader: BufReader<R>, mut writer: W) -> Result<i32>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let payload = match read_message(&mut reader).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                info!("input closed; shutting down");
                return Ok(if dispatcher.state().shutdown_requested() {
                    0
                } else {
                    1
                });
            }
            Err(error) => {
                warn!(%error, "malformed frame");
                continue;
            }
        };

        let message: Incoming = match serde_json::from_slice(&payload) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "undecodable message");
                continue;
            }
        };
        debug!(method = ?message.method, "dispatching");

        let outcome = dispatcher.handle(message);
        for notification in &outcome.notifications {
            write_message(&mut writer, &serde_json::to_vec(notification)?).await?;
        }
        if let Some(response) = &outcome.response {
            write_message(&mut writer, &serde_json::to_vec(response)?).await?;
        }
        for request in &outcome.requests {
            write_message(&mut writer, &serde_json::to_vec(request)?).await?;
        }
        if let Some(code) = outcome.exit {
            return Ok(code);
        }
    }
}

/// Read one `Content-Length`-framed message. `None` at clean EOF.
async fn read_message<R>(reader: &mut BufReader<R>) -> Result<Option<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line
            .strip_prefix("Content-Length:")
            .or_else(|| line.strip_prefix("content-length:"))
        {
            content_length = Some(value.trim().parse().context("bad Content-Length")?);
        }
        // Content-Type headers are read and ignored
    }
    let Some(length) = content_length else {
        bail!("frame without Content-Length");
    };
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

async fn write_message<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_framed_messages() {
        let data = b"Content-Length: 2\r\n\r\n{}".to_vec();
        let mut reader = BufReader::new(Cursor::new(data));
        let payload = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(payload, b"{}");
        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn writes_framed_messages() {
        let mut out = Vec::new();
        write_message(&mut out, b"{\"a\":1}").await.unwrap();
        assert_eq!(out, b"Content-Length: 7\r\n\r\n{\"a\":1}");
    }
}
