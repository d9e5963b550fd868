//! Unified error type for the Tankwire client.

use tankwire_protocol::{ProtocolError, Tag};
use tankwire_session::SessionError;
use tankwire_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tankwire` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TankwireError {
    /// A transport-level error (dial, send, recv). Fatal for the session.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, malformed payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (rejection, contained protocol failure).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The outbound queue was saturated and the message was dropped.
    #[error("outbound queue full, dropped `{tag}` message")]
    QueueFull { tag: Tag },

    /// The session is shutting down and no longer accepts sends.
    #[error("session is closed")]
    SessionClosed,

    /// The client configuration was rejected before dialing.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// One of the session's background tasks panicked or was cancelled.
    #[error("session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
