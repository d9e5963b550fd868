//! Server-originated warnings.
//!
//! Warnings never fail a session. Even a custom warning whose payload is
//! not the expected shape still comes through, just without a message.

use std::fmt;

use serde_json::Value;

use crate::{Envelope, Tag};

/// A warning the server sent about this client's behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// More than one action was sent for the same snapshot.
    PlayerAlreadyMadeAction,
    /// The action arrived while our tank was dead.
    ActionIgnoredDueToDead,
    /// The action arrived after the tick closed.
    SlowResponse,
    /// Free-form text from the server.
    Custom(Option<String>),
}

impl Warning {
    /// Reads a warning out of an envelope, or `None` if the tag isn't one.
    pub fn from_envelope(envelope: &Envelope) -> Option<Warning> {
        let warning = match envelope.tag() {
            Tag::PlayerAlreadyMadeActionWarning => {
                Warning::PlayerAlreadyMadeAction
            }
            Tag::ActionIgnoredDueToDeadWarning => {
                Warning::ActionIgnoredDueToDead
            }
            Tag::SlowResponseWarning => Warning::SlowResponse,
            Tag::CustomWarning => {
                Warning::Custom(envelope.payload().and_then(message_of))
            }
            _ => return None,
        };
        Some(warning)
    }

    /// The tag this warning arrives under.
    pub fn tag(&self) -> Tag {
        match self {
            Warning::PlayerAlreadyMadeAction => {
                Tag::PlayerAlreadyMadeActionWarning
            }
            Warning::ActionIgnoredDueToDead => {
                Tag::ActionIgnoredDueToDeadWarning
            }
            Warning::SlowResponse => Tag::SlowResponseWarning,
            Warning::Custom(_) => Tag::CustomWarning,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Warning::Custom(message) => message.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PlayerAlreadyMadeAction => {
                f.write_str("player already made an action this tick")
            }
            Warning::ActionIgnoredDueToDead => {
                f.write_str("action ignored: tank is dead")
            }
            Warning::SlowResponse => f.write_str("response arrived too late"),
            Warning::Custom(Some(message)) => f.write_str(message),
            Warning::Custom(None) => f.write_str("custom warning"),
        }
    }
}

/// `{"message": "..."}` or a bare string.
fn message_of(payload: &Value) -> Option<String> {
    match payload {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_warnings() {
        let w = Warning::from_envelope(&Envelope::new(Tag::SlowResponseWarning));
        assert_eq!(w, Some(Warning::SlowResponse));
        assert_eq!(Warning::SlowResponse.tag(), Tag::SlowResponseWarning);
        assert!(Warning::SlowResponse.message().is_none());
    }

    #[test]
    fn test_custom_warning_object_payload() {
        let env = Envelope::with_payload(
            Tag::CustomWarning,
            json!({"message": "stop spinning"}),
        );
        let w = Warning::from_envelope(&env).unwrap();
        assert_eq!(w.message(), Some("stop spinning"));
        assert_eq!(w.to_string(), "stop spinning");
    }

    #[test]
    fn test_custom_warning_bare_string_payload() {
        let env = Envelope::with_payload(Tag::CustomWarning, json!("hey"));
        let w = Warning::from_envelope(&env).unwrap();
        assert_eq!(w, Warning::Custom(Some("hey".into())));
    }

    #[test]
    fn test_custom_warning_odd_payload_has_no_message() {
        let env = Envelope::with_payload(Tag::CustomWarning, json!(17));
        assert_eq!(Warning::from_envelope(&env), Some(Warning::Custom(None)));
    }

    #[test]
    fn test_non_warning_tag() {
        assert!(Warning::from_envelope(&Envelope::new(Tag::GameStarted)).is_none());
    }
}
