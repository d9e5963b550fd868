//! Wire protocol for Tankwire.
//!
//! This crate defines the "language" the client and the game server speak:
//!
//! - **Envelope** ([`Envelope`], [`Tag`]): every frame is
//!   `{"type": <tag>, "payload": <json>?}`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): envelopes to and from
//!   bytes.
//! - **Payloads** ([`LobbyInfo`], [`GameEnd`], [`Warning`]): the typed
//!   contents of the lobby, game-end and warning messages.
//! - **Snapshot decoder** ([`decode_snapshot`]): the sparse `gameState`
//!   grid into a flat [`WorldSnapshot`].
//! - **Action encoder** ([`encode_action`], [`decode_action`]): one
//!   [`Action`] per tick, correlated to the snapshot it answers.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the session
//! state machine. It doesn't know about connections or phases; it only
//! knows how to turn frames into typed values and back.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope, WorldSnapshot) → Session (phase, agent)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod action;
mod codec;
mod envelope;
mod error;
mod game_end;
mod lobby;
mod snapshot;
mod warning;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use action::{
    AbilityKind, Action, MoveDirection, Rotation, decode_action,
    encode_action,
};
pub use codec::{Codec, JsonCodec};
pub use envelope::{Envelope, Tag};
pub use error::{ProtocolError, SnapshotError};
pub use game_end::{GameEnd, GameEndPlayer};
pub use lobby::{LobbyInfo, LobbyPlayer, ServerSettings};
pub use snapshot::{
    Bullet, BulletKind, Direction, Item, ItemKind, Laser, Mine, Orientation,
    Player, Tank, Turret, Wall, WorldSnapshot, Zone, ZoneStatus,
    decode_snapshot,
};
pub use warning::Warning;
