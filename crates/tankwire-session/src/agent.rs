//! The `Agent` trait: the extension point for bot authors.
//!
//! This is the single trait a bot implements. The protocol machine calls
//! these methods at the right moments; the bot only has to choose actions.

use tankwire_protocol::{Action, GameEnd, LobbyInfo, Warning, WorldSnapshot};

/// The decision-making side of a client.
///
/// An agent is created from the first lobby announcement and then lives
/// for the rest of the connection. Every method runs while the session
/// holds its state lock, so keep them short: a slow
/// [`next_move`](Agent::next_move) delays this tick's reply (the server
/// answers with a slow-response warning) but never stalls the socket.
///
/// Only `on_joining_lobby` and `next_move` are required. The other hooks
/// default to doing nothing.
pub trait Agent: Send + 'static {
    /// Creates the agent when the client first learns who it is.
    fn on_joining_lobby(lobby: &LobbyInfo) -> Self
    where
        Self: Sized;

    /// Called each time the roster or settings change after joining.
    /// `lobby` is the same, updated-in-place value every time.
    fn on_lobby_data_changed(&mut self, _lobby: &LobbyInfo) {}

    /// Called once when the server announces the game is about to start.
    fn on_game_starting(&mut self) {}

    /// Chooses this tick's action.
    ///
    /// Called at most once per snapshot id. `lobby` carries the client's
    /// own player id and the grid settings.
    fn next_move(&mut self, lobby: &LobbyInfo, snapshot: &WorldSnapshot)
    -> Action;

    /// Called for every server warning. Warnings never end the session.
    fn on_warning(&mut self, _warning: &Warning) {}

    /// Called once with the final standings.
    fn on_game_ended(&mut self, _game_end: &GameEnd) {}
}
