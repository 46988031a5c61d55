//! Line-delimited JSON-RPC over stdin/stdout.
//!
//! Each message is a single line terminated by `\n`. Requests are
//! dispatched on their own task so a slow handler never stops the session
//! from reading the next line; responses go out in completion order and
//! clients correlate them by `id`.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::task::{JoinError, JoinSet};

use crate::server::Server;
use crate::types::{
    JsonRpcRequest, McpResponse, ERR_CODE_INTERNAL, ERR_CODE_INVALID_REQ, ERR_CODE_PARSE,
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("read error: {0}")]
    Read(#[source] std::io::Error),
    #[error("write error: {0}")]
    Write(#[source] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads JSON-RPC lines from `R` and writes response lines to `W`.
///
/// Generic over reader and writer so sessions can run against in-memory
/// buffers in tests.
pub struct StdioTransport<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
}

impl StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport over the process's own stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Next non-blank line, trimmed. `None` on EOF.
    ///
    /// Cancel safe: a partially read line is kept for the next call.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.lines.next_line().await.map_err(TransportError::Read)? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    tracing::trace!(len = line.len(), "read message");
                    return Ok(Some(line.trim().to_string()));
                }
                None => return Ok(None),
            }
        }
    }

    /// Write one line and flush.
    pub async fn write_line(&mut self, message: &str) -> Result<(), TransportError> {
        tracing::trace!(len = message.len(), "writing message");
        self.writer
            .write_all(message.as_bytes())
            .await
            .map_err(TransportError::Write)?;
        self.writer.write_all(b"\n").await.map_err(TransportError::Write)?;
        self.writer.flush().await.map_err(TransportError::Write)
    }

    /// Serialize and write a response. Notification sentinels are skipped.
    pub async fn write_response(&mut self, resp: &McpResponse) -> Result<(), TransportError> {
        if resp.is_notification() {
            return Ok(());
        }
        let json = serde_json::to_string(resp)?;
        self.write_line(&json).await
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

/// Per-connection handshake state.
#[derive(Debug, Default)]
struct Session {
    initialized: bool,
}

impl Session {
    /// Reject requests that arrive before a successful `initialize`.
    fn gate(&self, req: &JsonRpcRequest) -> Option<McpResponse> {
        if self.initialized || req.is_notification() {
            return None;
        }
        match req.method.as_str() {
            "initialize" | "ping" => None,
            _ => Some(McpResponse::error(
                req.id.clone(),
                ERR_CODE_INVALID_REQ,
                "server not initialized",
            )),
        }
    }
}

enum Event {
    Line(Option<String>),
    Done(Result<McpResponse, JoinError>),
}

/// Run an MCP session until the input stream closes.
///
/// Returns after EOF once every in-flight request has been answered.
/// Malformed input fails only the offending line.
pub async fn serve<R, W>(
    server: Arc<Server>,
    transport: &mut StdioTransport<R, W>,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session::default();
    let mut in_flight: JoinSet<McpResponse> = JoinSet::new();

    loop {
        let event = tokio::select! {
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => Event::Done(done),
            line = transport.read_line() => Event::Line(line?),
        };

        let line = match event {
            Event::Done(done) => {
                write_joined(transport, done).await?;
                continue;
            }
            Event::Line(None) => break,
            Event::Line(Some(line)) => line,
        };

        let req = match parse_request(&line) {
            Ok(req) => req,
            Err(resp) => {
                transport.write_response(&resp).await?;
                continue;
            }
        };

        tracing::debug!(method = %req.method, id = ?req.id, "received request");

        if let Some(rejected) = session.gate(&req) {
            tracing::warn!(method = %req.method, "request before initialize");
            transport.write_response(&rejected).await?;
            continue;
        }

        if req.method == "initialize" && !req.is_notification() {
            // Handled inline so the handshake completes before the next line.
            let resp = server.handle(req).await;
            if !resp.is_error() {
                session.initialized = true;
            }
            transport.write_response(&resp).await?;
            continue;
        }

        in_flight.spawn(dispatch(Arc::clone(&server), req));
    }

    tracing::info!(pending = in_flight.len(), "input closed");
    while let Some(done) = in_flight.join_next().await {
        write_joined(transport, done).await?;
    }
    Ok(())
}

/// Handle one request on its own task. A panicking handler still owes the
/// client an answer, so the panic becomes an internal error for that id.
async fn dispatch(server: Arc<Server>, req: JsonRpcRequest) -> McpResponse {
    let id = req.id.clone();
    let method = req.method.clone();
    match tokio::spawn(async move { server.handle(req).await }).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(method = %method, id = ?id, error = %e, "request handler panicked");
            if id.is_none() {
                return McpResponse::notification();
            }
            McpResponse::error(id, ERR_CODE_INTERNAL, "Internal error")
        }
    }
}

async fn write_joined<R, W>(
    transport: &mut StdioTransport<R, W>,
    done: Result<McpResponse, JoinError>,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match done {
        Ok(resp) => transport.write_response(&resp).await,
        Err(e) => {
            tracing::error!(error = %e, "request task failed");
            Ok(())
        }
    }
}

/// Decode one line into a request, or the error response owed for it.
fn parse_request(line: &str) -> Result<JsonRpcRequest, McpResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse JSON-RPC message");
        McpResponse::error(None, ERR_CODE_PARSE, format!("Parse error: {}", e))
    })?;

    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(error = %e, "invalid JSON-RPC request");
        McpResponse::error(id, ERR_CODE_INVALID_REQ, format!("Invalid request: {}", e))
    })
}
