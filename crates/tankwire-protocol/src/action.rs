//! Actions and the action encoder.
//!
//! An agent answers each snapshot with exactly one [`Action`]. The encoder
//! turns it into one of four outbound envelopes, always stamped with the
//! id of the snapshot it answers so the server can match reply to tick:
//!
//! ```json
//! {"type": "movement",   "payload": {"direction": "forward", "gameStateId": "s1"}}
//! {"type": "rotation",   "payload": {"turretRotation": "left", "gameStateId": "s1"}}
//! {"type": "abilityUse", "payload": {"abilityType": "useRadar", "gameStateId": "s1"}}
//! {"type": "pass",       "payload": {"gameStateId": "s1"}}
//! ```
//!
//! A rotation axis that wasn't requested is left out of the payload
//! entirely. "Don't turn the turret" is not the same message as "turn the
//! turret by nothing".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Envelope, ProtocolError, Tag};

// ---------------------------------------------------------------------------
// Action vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rotation {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbilityKind {
    FireBullet,
    FireDoubleBullet,
    UseLaser,
    UseRadar,
    DropMine,
}

impl MoveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveDirection::Forward => "forward",
            MoveDirection::Backward => "backward",
        }
    }
}

impl Rotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::Left => "left",
            Rotation::Right => "right",
        }
    }
}

impl AbilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AbilityKind::FireBullet => "fireBullet",
            AbilityKind::FireDoubleBullet => "fireDoubleBullet",
            AbilityKind::UseLaser => "useLaser",
            AbilityKind::UseRadar => "useRadar",
            AbilityKind::DropMine => "dropMine",
        }
    }
}

/// What the agent wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(MoveDirection),
    /// Either axis may be left alone; both `None` is a legal no-op turn.
    Rotate {
        tank: Option<Rotation>,
        turret: Option<Rotation>,
    },
    Ability(AbilityKind),
    Pass,
}

impl Action {
    /// The outbound tag this action is sent under.
    pub fn tag(&self) -> Tag {
        match self {
            Action::Move(_) => Tag::Movement,
            Action::Rotate { .. } => Tag::Rotation,
            Action::Ability(_) => Tag::AbilityUse,
            Action::Pass => Tag::Pass,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Builds the reply envelope for `action`, answering snapshot
/// `game_state_id`. Never fails.
pub fn encode_action(action: &Action, game_state_id: &str) -> Envelope {
    let mut payload = Map::new();
    match action {
        Action::Move(direction) => {
            payload.insert("direction".into(), direction.as_str().into());
        }
        Action::Rotate { tank, turret } => {
            if let Some(rotation) = tank {
                payload.insert("tankRotation".into(), rotation.as_str().into());
            }
            if let Some(rotation) = turret {
                payload
                    .insert("turretRotation".into(), rotation.as_str().into());
            }
        }
        Action::Ability(kind) => {
            payload.insert("abilityType".into(), kind.as_str().into());
        }
        Action::Pass => {}
    }
    payload.insert("gameStateId".into(), game_state_id.into());
    Envelope::with_payload(action.tag(), Value::Object(payload))
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

// Unknown fields are rejected: a field belonging to another action kind
// fails the decode instead of being dropped.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MovementPayload {
    direction: MoveDirection,
    game_state_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RotationPayload {
    tank_rotation: Option<Rotation>,
    turret_rotation: Option<Rotation>,
    game_state_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AbilityPayload {
    ability_type: AbilityKind,
    game_state_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PassPayload {
    game_state_id: String,
}

/// Reads an outbound action envelope back into the action and the id of
/// the snapshot it answers.
///
/// # Errors
/// - [`ProtocolError::MalformedAction`] if the tag isn't an action tag.
/// - [`ProtocolError::MissingPayload`] / [`ProtocolError::MalformedPayload`]
///   if the payload doesn't fit the tag.
pub fn decode_action(
    envelope: &Envelope,
) -> Result<(Action, String), ProtocolError> {
    match envelope.tag() {
        Tag::Movement => {
            let p: MovementPayload = envelope.payload_as()?;
            Ok((Action::Move(p.direction), p.game_state_id))
        }
        Tag::Rotation => {
            let p: RotationPayload = envelope.payload_as()?;
            let action = Action::Rotate {
                tank: p.tank_rotation,
                turret: p.turret_rotation,
            };
            Ok((action, p.game_state_id))
        }
        Tag::AbilityUse => {
            let p: AbilityPayload = envelope.payload_as()?;
            Ok((Action::Ability(p.ability_type), p.game_state_id))
        }
        Tag::Pass => {
            let p: PassPayload = envelope.payload_as()?;
            Ok((Action::Pass, p.game_state_id))
        }
        other => Err(ProtocolError::MalformedAction(other.clone())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =====================================================================
    // Wire shape
    // =====================================================================

    #[test]
    fn test_move_payload() {
        let env = encode_action(&Action::Move(MoveDirection::Backward), "s9");
        assert_eq!(env.tag(), &Tag::Movement);
        assert_eq!(
            env.payload(),
            Some(&json!({"direction": "backward", "gameStateId": "s9"}))
        );
    }

    #[test]
    fn test_rotate_omits_unrequested_axis() {
        let action = Action::Rotate {
            tank: None,
            turret: Some(Rotation::Left),
        };
        let env = encode_action(&action, "s1");
        let payload = env.payload().unwrap().as_object().unwrap();
        assert_eq!(payload.get("turretRotation"), Some(&json!("left")));
        assert!(!payload.contains_key("tankRotation"));
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_ability_payload() {
        let env =
            encode_action(&Action::Ability(AbilityKind::FireDoubleBullet), "s2");
        assert_eq!(env.tag(), &Tag::AbilityUse);
        assert_eq!(
            env.payload(),
            Some(&json!({"abilityType": "fireDoubleBullet", "gameStateId": "s2"}))
        );
    }

    #[test]
    fn test_pass_carries_only_the_snapshot_id() {
        let env = encode_action(&Action::Pass, "s3");
        assert_eq!(env.tag(), &Tag::Pass);
        assert_eq!(env.payload(), Some(&json!({"gameStateId": "s3"})));
    }

    #[test]
    fn test_as_str_matches_serde_names() {
        for kind in [
            AbilityKind::FireBullet,
            AbilityKind::FireDoubleBullet,
            AbilityKind::UseLaser,
            AbilityKind::UseRadar,
            AbilityKind::DropMine,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
        for r in [Rotation::Left, Rotation::Right] {
            assert_eq!(serde_json::to_value(r).unwrap(), json!(r.as_str()));
        }
        for d in [MoveDirection::Forward, MoveDirection::Backward] {
            assert_eq!(serde_json::to_value(d).unwrap(), json!(d.as_str()));
        }
    }

    // =====================================================================
    // Decoding
    // =====================================================================

    #[test]
    fn test_decode_recovers_exactly_what_was_set() {
        let cases = [
            Action::Move(MoveDirection::Forward),
            Action::Rotate {
                tank: Some(Rotation::Right),
                turret: None,
            },
            Action::Rotate {
                tank: None,
                turret: None,
            },
            Action::Rotate {
                tank: Some(Rotation::Left),
                turret: Some(Rotation::Right),
            },
            Action::Ability(AbilityKind::DropMine),
            Action::Pass,
        ];
        for action in cases {
            let env = encode_action(&action, "tick-77");
            let (back, id) = decode_action(&env).unwrap();
            assert_eq!(back, action);
            assert_eq!(id, "tick-77");
        }
    }

    #[test]
    fn test_decode_rejects_non_action_tag() {
        let err = decode_action(&Envelope::new(Tag::LobbyDataRequest))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedAction(Tag::LobbyDataRequest)
        ));
    }

    #[test]
    fn test_decode_rejects_foreign_fields() {
        let env = Envelope::with_payload(
            Tag::Pass,
            json!({"gameStateId": "s1", "direction": "forward"}),
        );
        assert!(matches!(
            decode_action(&env),
            Err(ProtocolError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_decode_requires_snapshot_id() {
        let env = Envelope::with_payload(
            Tag::Movement,
            json!({"direction": "forward"}),
        );
        assert!(decode_action(&env).is_err());
    }
}
