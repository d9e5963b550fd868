//! The `lobbyData` payload.

use serde::{Deserialize, Serialize};

/// Who we are, who else is in the lobby, and how the match is configured.
///
/// The session keeps exactly one of these per connection. Later
/// `lobbyData` messages are folded in with [`LobbyInfo::apply`] rather than
/// replacing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyInfo {
    /// The id the server assigned to this client.
    pub player_id: String,
    pub players: Vec<LobbyPlayer>,
    pub server_settings: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyPlayer {
    pub id: String,
    pub nickname: String,
    pub color: u64,
}

/// Match settings as announced by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// Side length of the square map, in tiles.
    pub grid_dimension: usize,
    pub number_of_players: u32,
    pub seed: i64,
    /// Milliseconds between snapshots.
    pub broadcast_interval: u64,
    #[serde(default)]
    pub eager_broadcast: bool,
    /// Sandbox lobbies start streaming state without a `gameStarting`.
    #[serde(default)]
    pub sandbox_mode: bool,
    /// Tick limit; `None` when the match runs until a win condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl LobbyInfo {
    /// Overwrites this lobby with a newer announcement, in place.
    pub fn apply(&mut self, fresh: LobbyInfo) {
        let LobbyInfo {
            player_id,
            players,
            server_settings,
        } = fresh;
        self.player_id = player_id;
        self.players = players;
        self.server_settings = server_settings;
    }

    pub fn grid_dimension(&self) -> usize {
        self.server_settings.grid_dimension
    }

    pub fn is_sandbox(&self) -> bool {
        self.server_settings.sandbox_mode
    }

    /// Looks up a lobby member by id.
    pub fn player(&self, id: &str) -> Option<&LobbyPlayer> {
        self.players.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lobby_json() -> serde_json::Value {
        json!({
            "playerId": "p1",
            "players": [
                {"id": "p1", "nickname": "alpha", "color": 16711680},
                {"id": "p2", "nickname": "bravo", "color": 255}
            ],
            "serverSettings": {
                "gridDimension": 24,
                "numberOfPlayers": 2,
                "seed": 1234,
                "broadcastInterval": 100,
                "eagerBroadcast": false,
                "sandboxMode": false,
                "matchName": "scrim",
                "version": "1.0.0"
            }
        })
    }

    #[test]
    fn test_lobby_decodes_camel_case() {
        let lobby: LobbyInfo = serde_json::from_value(lobby_json()).unwrap();
        assert_eq!(lobby.player_id, "p1");
        assert_eq!(lobby.players.len(), 2);
        assert_eq!(lobby.grid_dimension(), 24);
        assert_eq!(lobby.server_settings.ticks, None);
        assert_eq!(lobby.server_settings.match_name.as_deref(), Some("scrim"));
        assert!(!lobby.is_sandbox());
        assert_eq!(lobby.player("p2").map(|p| p.color), Some(255));
    }

    #[test]
    fn test_optional_settings_default() {
        let lobby: LobbyInfo = serde_json::from_value(json!({
            "playerId": "p1",
            "players": [],
            "serverSettings": {
                "gridDimension": 10,
                "numberOfPlayers": 4,
                "seed": 0,
                "broadcastInterval": 50
            }
        }))
        .unwrap();
        assert!(!lobby.server_settings.sandbox_mode);
        assert!(!lobby.server_settings.eager_broadcast);
        assert!(lobby.server_settings.version.is_none());
    }

    #[test]
    fn test_apply_updates_in_place() {
        let mut lobby: LobbyInfo =
            serde_json::from_value(lobby_json()).unwrap();
        let mut fresh = lobby.clone();
        fresh.players.pop();
        fresh.server_settings.ticks = Some(3000);

        let before = &lobby as *const LobbyInfo;
        lobby.apply(fresh);
        assert_eq!(before, &lobby as *const LobbyInfo);
        assert_eq!(lobby.players.len(), 1);
        assert_eq!(lobby.server_settings.ticks, Some(3000));
    }
}
