//! Transport abstraction layer for Tankwire.
//!
//! Provides the [`Connection`] trait, which hides the physical link to the
//! game server behind three operations: send a frame, receive a frame,
//! close. The session layer above only ever sees bytes.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client dialer via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;

/// Opaque identifier for a connection, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single duplex connection that can send and receive whole frames.
///
/// `send` and `recv` take `&self` so one task can sit in `recv` while
/// another writes. Implementations must not let a pending `recv` block a
/// concurrent `send`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one complete frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next data frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Sends a protocol-level close notification.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_formats_for_logs() {
        let id = ConnectionId::new(7);
        assert_eq!(format!("{id}"), "conn-7");
        assert_eq!(id.into_inner(), 7);
    }

    #[test]
    fn test_connection_ids_compare_by_value() {
        let ids: std::collections::HashSet<_> =
            [1, 2, 1].into_iter().map(ConnectionId::new).collect();
        assert_eq!(ids.len(), 2);
    }
}
