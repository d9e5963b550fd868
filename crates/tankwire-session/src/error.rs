//! Error types for the session layer.

use tankwire_protocol::ProtocolError;

/// Errors produced while handling one inbound envelope.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server refused the connection. The session is over.
    #[error("connection rejected by server: {reason}")]
    ConnectionRejected { reason: String },

    /// The envelope's payload could not be decoded. Only that message is
    /// lost.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// Whether this error ends the session rather than just the message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::ConnectionRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankwire_protocol::Tag;

    #[test]
    fn test_rejection_is_fatal() {
        let err = SessionError::ConnectionRejected {
            reason: "lobby full".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "connection rejected by server: lobby full");
    }

    #[test]
    fn test_protocol_error_is_contained() {
        let err: SessionError = ProtocolError::MissingPayload {
            tag: Tag::GameState,
        }
        .into();
        assert!(!err.is_fatal());
    }
}
