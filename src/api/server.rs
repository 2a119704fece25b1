//! WebSocket control server.
//!
//! Owns the listening socket and the per-connection lifecycle: accept,
//! handle messages strictly in arrival order, contain every failure at the
//! message boundary, and keep the connection open until the peer closes it.
//! Connections are isolated from each other; a slow OS call stalls only the
//! connection that issued it.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use super::handlers::CommandHandler;
use super::protocol::{ProtocolError, Response};

/// WebSocket server for remote mixer control.
pub struct ControlServer {
    listener: TcpListener,
    handler: Arc<CommandHandler>,
}

impl ControlServer {
    /// Bind the loopback listener. Port 0 picks an ephemeral port.
    pub async fn bind(handler: CommandHandler, port: u16) -> std::io::Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the process exits. Each connection gets its
    /// own task; its messages are processed one at a time in arrival order.
    pub async fn run(&self) -> std::io::Result<()> {
        log::info!("control server listening on ws://{}", self.local_addr()?);

        loop {
            let (stream, addr) = self.listener.accept().await?;
            let handler = self.handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, handler).await {
                    log::error!("connection error from {addr}: {e}");
                }
            });
        }
    }
}

/// Serve one client until it disconnects.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handler: Arc<CommandHandler>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    log::info!("client connected: {addr}");

    let (mut write, mut read) = ws_stream.split();

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let response = respond(handler.clone(), text).await;
                let json = serde_json::to_string(&response)?;
                write.send(Message::Text(json)).await?;
            }
            Ok(Message::Ping(payload)) => {
                write.send(Message::Pong(payload)).await?;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("websocket error from {addr}: {e}");
                break;
            }
        }
    }

    log::info!("client disconnected: {addr}");
    Ok(())
}

/// Run one message through the handler off the async reactor. A panic
/// inside dispatch is absorbed at the join boundary and answered like any
/// other malformed request.
async fn respond(handler: Arc<CommandHandler>, text: String) -> Response {
    tokio::task::spawn_blocking(move || handler.handle_text(&text))
        .await
        .unwrap_or_else(|e| {
            log::error!("request handling panicked: {e}");
            Response::error(ProtocolError::BadFormat)
        })
}
