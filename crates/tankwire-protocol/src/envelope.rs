//! The uniform message wrapper and the tag vocabulary.
//!
//! Every frame, in both directions, is a JSON object with a `type` string
//! and an optional `payload`:
//!
//! ```json
//! { "type": "gameState", "payload": { "id": "...", "tick": 12, ... } }
//! { "type": "pong" }
//! ```
//!
//! Tags this client doesn't know still decode: they land in
//! [`Tag::Unrecognized`] with the payload kept as raw JSON, so a server
//! that adds a message type never breaks an older client.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// The `type` field of an envelope.
///
/// Serialized as its camelCase wire string. `#[serde(from, into)]` routes
/// (de)serialization through `String`, so any string is accepted and
/// unknown ones become [`Tag::Unrecognized`] instead of a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tag {
    // -- Keep-alive (both directions) --
    Ping,
    Pong,

    // -- Server → client --
    ConnectionAccepted,
    ConnectionRejected,
    LobbyData,
    LobbyDeleted,
    GameStarting,
    GameStarted,
    GameInProgress,
    GameState,
    GameEnded,
    CustomWarning,
    PlayerAlreadyMadeActionWarning,
    ActionIgnoredDueToDeadWarning,
    SlowResponseWarning,
    InvalidPacketTypeError,
    InvalidPacketUsageError,

    // -- Client → server --
    LobbyDataRequest,
    ReadyToReceiveGameState,
    GameStatusRequest,
    Movement,
    Rotation,
    AbilityUse,
    Pass,

    /// Any tag not listed above, verbatim.
    Unrecognized(String),
}

impl Tag {
    /// The wire spelling of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Ping => "ping",
            Tag::Pong => "pong",
            Tag::ConnectionAccepted => "connectionAccepted",
            Tag::ConnectionRejected => "connectionRejected",
            Tag::LobbyData => "lobbyData",
            Tag::LobbyDeleted => "lobbyDeleted",
            Tag::GameStarting => "gameStarting",
            Tag::GameStarted => "gameStarted",
            Tag::GameInProgress => "gameInProgress",
            Tag::GameState => "gameState",
            Tag::GameEnded => "gameEnded",
            Tag::CustomWarning => "customWarning",
            Tag::PlayerAlreadyMadeActionWarning => {
                "playerAlreadyMadeActionWarning"
            }
            Tag::ActionIgnoredDueToDeadWarning => {
                "actionIgnoredDueToDeadWarning"
            }
            Tag::SlowResponseWarning => "slowResponseWarning",
            Tag::InvalidPacketTypeError => "invalidPacketTypeError",
            Tag::InvalidPacketUsageError => "invalidPacketUsageError",
            Tag::LobbyDataRequest => "lobbyDataRequest",
            Tag::ReadyToReceiveGameState => "readyToReceiveGameState",
            Tag::GameStatusRequest => "gameStatusRequest",
            Tag::Movement => "movement",
            Tag::Rotation => "rotation",
            Tag::AbilityUse => "abilityUse",
            Tag::Pass => "pass",
            Tag::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// Parses a wire tag. Never fails.
    pub fn parse(raw: &str) -> Tag {
        match raw {
            "ping" => Tag::Ping,
            "pong" => Tag::Pong,
            "connectionAccepted" => Tag::ConnectionAccepted,
            "connectionRejected" => Tag::ConnectionRejected,
            "lobbyData" => Tag::LobbyData,
            "lobbyDeleted" => Tag::LobbyDeleted,
            "gameStarting" => Tag::GameStarting,
            "gameStarted" => Tag::GameStarted,
            "gameInProgress" => Tag::GameInProgress,
            "gameState" => Tag::GameState,
            "gameEnded" => Tag::GameEnded,
            "customWarning" => Tag::CustomWarning,
            "playerAlreadyMadeActionWarning" => {
                Tag::PlayerAlreadyMadeActionWarning
            }
            "actionIgnoredDueToDeadWarning" => {
                Tag::ActionIgnoredDueToDeadWarning
            }
            "slowResponseWarning" => Tag::SlowResponseWarning,
            "invalidPacketTypeError" => Tag::InvalidPacketTypeError,
            "invalidPacketUsageError" => Tag::InvalidPacketUsageError,
            "lobbyDataRequest" => Tag::LobbyDataRequest,
            "readyToReceiveGameState" => Tag::ReadyToReceiveGameState,
            "gameStatusRequest" => Tag::GameStatusRequest,
            "movement" => Tag::Movement,
            "rotation" => Tag::Rotation,
            "abilityUse" => Tag::AbilityUse,
            "pass" => Tag::Pass,
            other => Tag::Unrecognized(other.to_string()),
        }
    }

    /// True for the four server warning tags.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Tag::CustomWarning
                | Tag::PlayerAlreadyMadeActionWarning
                | Tag::ActionIgnoredDueToDeadWarning
                | Tag::SlowResponseWarning
        )
    }

    /// True for the server's packet error reports.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Tag::InvalidPacketTypeError | Tag::InvalidPacketUsageError
        )
    }
}

impl From<String> for Tag {
    fn from(raw: String) -> Self {
        match Tag::parse(&raw) {
            Tag::Unrecognized(_) => Tag::Unrecognized(raw),
            known => known,
        }
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One wire message: a tag and an optional JSON payload.
///
/// Fields are private so an envelope can't change after it is built.
/// `"payload": null` and a missing payload both read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    tag: Tag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Envelope {
    /// An envelope with no payload.
    pub fn new(tag: Tag) -> Self {
        Self { tag, payload: None }
    }

    /// An envelope carrying `payload`.
    pub fn with_payload(tag: Tag, payload: Value) -> Self {
        Self {
            tag,
            payload: Some(payload),
        }
    }

    /// The keep-alive reply.
    pub fn pong() -> Self {
        Self::new(Tag::Pong)
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Deserializes the payload into `T`.
    ///
    /// # Errors
    /// - [`ProtocolError::MissingPayload`] if there is no payload.
    /// - [`ProtocolError::MalformedPayload`] if it doesn't fit `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let payload =
            self.payload
                .as_ref()
                .ok_or_else(|| ProtocolError::MissingPayload {
                    tag: self.tag.clone(),
                })?;
        T::deserialize(payload).map_err(|source| {
            ProtocolError::MalformedPayload {
                tag: self.tag.clone(),
                source,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
