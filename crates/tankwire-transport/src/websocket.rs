//! WebSocket client connection using `tokio-tungstenite`.
//!
//! The stream is split into its sink and stream halves, each behind its own
//! lock. The read loop parks inside `recv` for most of a session's life, so
//! a single lock around the whole socket would starve every writer.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use url::Url;

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A single client-side WebSocket connection to a game server.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Opens a WebSocket to `endpoint` and completes the HTTP upgrade.
    ///
    /// The endpoint's query string travels with the upgrade request, which
    /// is how the server learns the player's nickname and join code.
    ///
    /// # Errors
    /// - [`TransportError::InvalidEndpoint`] for a non-`ws`/`wss` URL or
    ///   one without a host.
    /// - [`TransportError::ConnectFailed`] when the TCP connect or the
    ///   upgrade handshake fails.
    pub async fn connect(endpoint: &Url) -> Result<Self, TransportError> {
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme `{}`", endpoint.scheme()),
            });
        }
        if endpoint.host_str().is_none() {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "missing host".to_string(),
            });
        }

        let (ws, response) = tokio_tungstenite::connect_async(endpoint.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed {
                endpoint: redact(endpoint),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ),
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(
            %id,
            endpoint = %redact(endpoint),
            status = %response.status(),
            "WebSocket handshake complete"
        );

        let (sink, stream) = ws.split();
        Ok(Self {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        // The server speaks JSON text frames; anything that isn't UTF-8
        // goes out as binary rather than being mangled.
        let msg = match String::from_utf8(data.to_vec()) {
            Ok(text) => Message::Text(text.into()),
            Err(e) => Message::Binary(e.into_bytes().into()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| match e {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(
                tungstenite::error::ProtocolError::SendAfterClosing,
            ) => TransportError::ConnectionClosed(e.to_string()),
            e => TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            )),
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(id = %self.id, ?frame, "close frame received");
                    return Ok(None);
                }
                None => return Ok(None),
                // Transport-level ping/pong is answered by tungstenite.
                Some(Ok(_)) => continue,
                Some(Err(
                    tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::AlreadyClosed,
                )) => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self.sink.lock().await.close().await {
            Ok(())
            | Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed,
            ) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The endpoint without its query string, for logs and error messages.
fn redact(endpoint: &Url) -> String {
    let mut bare = endpoint.clone();
    bare.set_query(None);
    bare.to_string()
}
