//! The `gameEnded` payload.

use serde::{Deserialize, Serialize};

/// Final standings, in the order the server sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub players: Vec<GameEndPlayer>,
}

/// One row of the final standings.
///
/// Only `id` and `score` are required; older servers send nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndPlayer {
    pub id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub color: u64,
    pub score: i64,
    #[serde(default)]
    pub kills: u32,
}

impl GameEnd {
    /// The player with the highest score, first one wins ties.
    pub fn leader(&self) -> Option<&GameEndPlayer> {
        self.players
            .iter()
            .reduce(|best, p| if p.score > best.score { p } else { best })
    }
}
