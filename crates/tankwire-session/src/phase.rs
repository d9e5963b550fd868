//! Connection lifecycle phases.

use std::fmt;

/// Where a connection is in its lifecycle.
///
/// ```text
/// Connecting ──accepted──→ AwaitingLobby ──lobbyData──→ LobbyReady
///                                                          │
///      ┌──────────────── gameInProgress / snapshot ────────┤
///      ▼                                                   ▼ gameStarting
///  InProgress ←──── gameStarted / first snapshot ──── GameStarting
///      │
///      ▼ gameEnded
///    Ended
///
/// any phase ──(rejection, connection loss, cancellation)──→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Socket is open; waiting for the server to accept us.
    Connecting,
    /// Accepted; the lobby has been requested but not yet received.
    AwaitingLobby,
    /// The lobby is known and the agent exists.
    LobbyReady,
    /// The server announced the start and we said we're ready.
    GameStarting,
    /// Snapshots are flowing and being answered.
    InProgress,
    /// The game is over; snapshots are no longer answered.
    Ended,
    /// The session is finished. Nothing is processed any more.
    Closed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Connecting => "connecting",
            Phase::AwaitingLobby => "awaiting-lobby",
            Phase::LobbyReady => "lobby-ready",
            Phase::GameStarting => "game-starting",
            Phase::InProgress => "in-progress",
            Phase::Ended => "ended",
            Phase::Closed => "closed",
        }
    }

    /// Phases in which a `gameEnded` is accepted. A sandbox or
    /// mid-game join can end while still in `LobbyReady`.
    pub fn accepts_game_end(self) -> bool {
        matches!(
            self,
            Phase::LobbyReady | Phase::GameStarting | Phase::InProgress
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
