//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between [`Envelope`]s and raw frame
//! bytes. The session runner only holds something that implements
//! [`Codec`], so the framing could change without touching the read and
//! write loops.

use serde_json::Value;

use crate::{Envelope, ProtocolError};

/// Converts envelopes to frame bytes and back.
///
/// `Send + Sync + 'static` because one codec is shared by the read loop,
/// the write path and every dispatch task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes an envelope into one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one frame into an envelope.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedEnvelope`] if the bytes are not
    /// well-formed or lack a tag.
    fn decode(&self, data: &[u8]) -> Result<Envelope, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] for the game server's JSON text frames.
///
/// ## Example
///
/// ```rust
/// use tankwire_protocol::{Codec, Envelope, JsonCodec, Tag};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Envelope::pong()).unwrap();
/// assert_eq!(bytes, br#"{"type":"pong"}"#);
///
/// let decoded = codec.decode(br#"{"type":"ping"}"#).unwrap();
/// assert_eq!(decoded.tag(), &Tag::Ping);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(envelope).map_err(ProtocolError::Encode)
    }

    fn decode(&self, data: &[u8]) -> Result<Envelope, ProtocolError> {
        // Parse to a `Value` first: serde would happily read a struct out
        // of a JSON array, and only objects are envelopes.
        let value: Value = serde_json::from_slice(data)
            .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))?;
        if !value.is_object() {
            return Err(ProtocolError::MalformedEnvelope(
                "frame is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tag;
    use serde_json::json;

    #[test]
    fn test_encode_with_payload() {
        let env =
            Envelope::with_payload(Tag::Pass, json!({"gameStateId": "s1"}));
        let bytes = JsonCodec.encode(&env).unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, json!({"type": "pass", "payload": {"gameStateId": "s1"}}));
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let err = JsonCodec.decode(b"not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_missing_type_is_malformed() {
        let err = JsonCodec.decode(br#"{"payload": {}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_non_string_type_is_malformed() {
        let err = JsonCodec.decode(br#"{"type": 7}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_array_is_malformed() {
        let err = JsonCodec.decode(br#"["ping", null]"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_decode_unknown_tag_succeeds() {
        let env = JsonCodec
            .decode(br#"{"type": "weatherReport", "payload": [1, 2]}"#)
            .unwrap();
        assert_eq!(env.tag(), &Tag::Unrecognized("weatherReport".into()));
        assert_eq!(env.payload(), Some(&json!([1, 2])));
    }
}
