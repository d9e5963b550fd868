//! The snapshot decoder.
//!
//! A `gameState` payload describes the map as a sparse grid: `tiles[x][y]`
//! is a list of entity descriptors, each `{"type": <kind>, "payload": ..}`.
//! [`decode_snapshot`] walks that grid once and sorts every descriptor into
//! a flat, typed list on [`WorldSnapshot`], stamped with the cell it came
//! from.
//!
//! ```json
//! "tiles": [
//!   [ [], [{"type": "wall"}] ],
//!   [ [{"type": "tank", "payload": {"ownerId": "p1", ...}}], [] ]
//! ]
//! ```
//!
//! Decoding is all-or-nothing. An unknown entity kind, a descriptor that
//! doesn't fit its kind, a grid of the wrong size or a zone status that
//! contradicts its own `type` fails the whole snapshot. Acting on half a
//! map is worse than skipping a tick.
//!
//! # Absent is not zero
//!
//! The server only reveals some fields to the tank's owner (health, ammo,
//! regen timers, secondary item) and some roster fields only once the game
//! is running (score). Those are `Option`s here and stay `None` when the
//! server leaves them out.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::SnapshotError;

// ---------------------------------------------------------------------------
// Shared vocabulary
// ---------------------------------------------------------------------------

/// Facing of a tank, turret or bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulletKind {
    #[serde(alias = "bullet")]
    Basic,
    #[serde(alias = "doubleBullet")]
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Pick-ups lying on the map, and what a tank can carry as its secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    DoubleBullet,
    Laser,
    Radar,
    Mine,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turret {
    pub direction: Direction,
    /// Owner-only.
    pub bullet_count: Option<u32>,
    /// Owner-only.
    pub ticks_to_regen_bullet: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tank {
    pub x: usize,
    pub y: usize,
    pub owner_id: String,
    pub direction: Direction,
    pub turret: Turret,
    /// Owner-only.
    pub health: Option<u32>,
    /// Owner-only; `None` also when the owner carries nothing.
    pub secondary_item: Option<ItemKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall {
    pub x: usize,
    pub y: usize,
}

/// A bullet in flight. `id` is unique among bullets only.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub x: usize,
    pub y: usize,
    pub id: u64,
    pub direction: Direction,
    /// Tiles per tick.
    pub speed: f64,
    pub kind: BulletKind,
}

/// One tile of a laser beam. `id` is unique among lasers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Laser {
    pub x: usize,
    pub y: usize,
    pub id: u64,
    pub orientation: Orientation,
}

/// A mine. `id` is unique among mines only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mine {
    pub x: usize,
    pub y: usize,
    pub id: u64,
    /// Set once the mine has been triggered.
    pub explosion_remaining_ticks: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub x: usize,
    pub y: usize,
    pub kind: ItemKind,
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// Capture progress of a zone. Exactly one arm, matching the wire `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneStatus {
    Neutral,
    BeingCaptured {
        remaining_ticks: u64,
        player_id: String,
    },
    Captured {
        player_id: String,
    },
    BeingContested {
        captured_by_id: Option<String>,
    },
    BeingRetaken {
        remaining_ticks: u64,
        captured_by_id: String,
        retaken_by_id: String,
    },
}

impl ZoneStatus {
    /// The wire `type` this status was decoded from.
    pub fn kind(&self) -> &'static str {
        match self {
            ZoneStatus::Neutral => "neutral",
            ZoneStatus::BeingCaptured { .. } => "beingCaptured",
            ZoneStatus::Captured { .. } => "captured",
            ZoneStatus::BeingContested { .. } => "beingContested",
            ZoneStatus::BeingRetaken { .. } => "beingRetaken",
        }
    }

    /// The player currently holding the zone, if anyone does.
    pub fn owner(&self) -> Option<&str> {
        match self {
            ZoneStatus::Captured { player_id } => Some(player_id.as_str()),
            ZoneStatus::BeingContested { captured_by_id } => {
                captured_by_id.as_deref()
            }
            ZoneStatus::BeingRetaken { captured_by_id, .. } => {
                Some(captured_by_id.as_str())
            }
            ZoneStatus::Neutral | ZoneStatus::BeingCaptured { .. } => None,
        }
    }
}

/// A rectangular capture zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Server-assigned label; by convention an ASCII letter code.
    pub index: u32,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub status: ZoneStatus,
}

impl Zone {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.x..self.x.saturating_add(self.width)).contains(&x)
            && (self.y..self.y.saturating_add(self.height)).contains(&y)
    }
}

// ---------------------------------------------------------------------------
// Players and the snapshot
// ---------------------------------------------------------------------------

/// A roster entry as of this tick.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub nickname: String,
    pub color: u64,
    pub ping: Option<u32>,
    /// Absent before the game starts.
    pub score: Option<i64>,
    /// Ticks until a dead tank respawns.
    pub ticks_to_regen: Option<u32>,
    pub is_using_radar: Option<bool>,
}

/// One tick's complete view of the world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub id: String,
    pub tick: u64,
    pub players: Vec<Player>,
    pub tanks: Vec<Tank>,
    pub walls: Vec<Wall>,
    pub bullets: Vec<Bullet>,
    pub lasers: Vec<Laser>,
    pub mines: Vec<Mine>,
    pub items: Vec<Item>,
    pub zones: Vec<Zone>,
    /// `visibility[y][x]`, `gridDimension` rows of `gridDimension` cells.
    pub visibility: Vec<Vec<bool>>,
}

impl WorldSnapshot {
    /// The tank owned by `player_id`, if it is alive and visible.
    pub fn tank_of(&self, player_id: &str) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.owner_id == player_id)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Out-of-grid coordinates are never visible.
    pub fn is_visible(&self, x: usize, y: usize) -> bool {
        self.visibility
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn wall_at(&self, x: usize, y: usize) -> bool {
        self.walls.iter().any(|w| w.x == x && w.y == y)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawGameState {
    id: String,
    tick: u64,
    players: Vec<Player>,
    map: RawMap,
}

#[derive(Deserialize)]
struct RawMap {
    tiles: Vec<Vec<Vec<RawTile>>>,
    #[serde(default)]
    zones: Vec<RawZone>,
    visibility: Vec<String>,
}

/// A descriptor before its kind is known. The payload stays raw until
/// the kind picks a sub-decoder.
#[derive(Deserialize)]
struct RawTile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTank {
    owner_id: String,
    direction: Direction,
    turret: Turret,
    health: Option<u32>,
    secondary_item: Option<ItemKind>,
}

#[derive(Deserialize)]
struct RawBullet {
    id: u64,
    direction: Direction,
    speed: f64,
    #[serde(rename = "type")]
    kind: BulletKind,
}

#[derive(Deserialize)]
struct RawLaser {
    id: u64,
    orientation: Orientation,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMine {
    id: u64,
    explosion_remaining_ticks: Option<u32>,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(rename = "type")]
    kind: ItemKind,
}

#[derive(Deserialize)]
struct RawZone {
    index: u32,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    status: Value,
}

// Zone status arms. `deny_unknown_fields` is what turns "type says
// captured but the fields say beingRetaken" into an error.

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NeutralFields {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BeingCapturedFields {
    remaining_ticks: u64,
    player_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CapturedFields {
    player_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BeingContestedFields {
    captured_by_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BeingRetakenFields {
    remaining_ticks: u64,
    captured_by_id: String,
    retaken_by_id: String,
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decodes a `gameState` payload for a `grid_dimension`-sized map.
///
/// # Errors
/// Returns a [`SnapshotError`] naming the first offending cell, row or
/// zone. Nothing is returned for a partially valid payload.
pub fn decode_snapshot(
    payload: &Value,
    grid_dimension: usize,
) -> Result<WorldSnapshot, SnapshotError> {
    let raw = RawGameState::deserialize(payload).map_err(SnapshotError::Shape)?;

    let mut snapshot = WorldSnapshot {
        id: raw.id,
        tick: raw.tick,
        players: raw.players,
        tanks: Vec::new(),
        walls: Vec::new(),
        bullets: Vec::new(),
        lasers: Vec::new(),
        mines: Vec::new(),
        items: Vec::new(),
        zones: Vec::with_capacity(raw.map.zones.len()),
        visibility: decode_visibility(&raw.map.visibility, grid_dimension)?,
    };

    if raw.map.tiles.len() != grid_dimension {
        return Err(SnapshotError::ColumnCount {
            expected: grid_dimension,
            actual: raw.map.tiles.len(),
        });
    }
    for (x, column) in raw.map.tiles.into_iter().enumerate() {
        if column.len() != grid_dimension {
            return Err(SnapshotError::CellCount {
                x,
                expected: grid_dimension,
                actual: column.len(),
            });
        }
        for (y, cell) in column.into_iter().enumerate() {
            for tile in cell {
                decode_tile(&mut snapshot, x, y, tile)?;
            }
        }
    }

    for zone in raw.map.zones {
        snapshot.zones.push(decode_zone(zone, grid_dimension)?);
    }

    Ok(snapshot)
}

/// Dispatches one descriptor on its kind and appends the typed entity.
fn decode_tile(
    snapshot: &mut WorldSnapshot,
    x: usize,
    y: usize,
    tile: RawTile,
) -> Result<(), SnapshotError> {
    let RawTile { kind, payload } = tile;
    match kind.as_str() {
        "wall" => snapshot.walls.push(Wall { x, y }),
        "tank" => {
            let raw: RawTank = entity(x, y, &kind, payload)?;
            snapshot.tanks.push(Tank {
                x,
                y,
                owner_id: raw.owner_id,
                direction: raw.direction,
                turret: raw.turret,
                health: raw.health,
                secondary_item: raw.secondary_item,
            });
        }
        "bullet" => {
            let raw: RawBullet = entity(x, y, &kind, payload)?;
            snapshot.bullets.push(Bullet {
                x,
                y,
                id: raw.id,
                direction: raw.direction,
                speed: raw.speed,
                kind: raw.kind,
            });
        }
        "laser" => {
            let raw: RawLaser = entity(x, y, &kind, payload)?;
            snapshot.lasers.push(Laser {
                x,
                y,
                id: raw.id,
                orientation: raw.orientation,
            });
        }
        "mine" => {
            let raw: RawMine = entity(x, y, &kind, payload)?;
            snapshot.mines.push(Mine {
                x,
                y,
                id: raw.id,
                explosion_remaining_ticks: raw.explosion_remaining_ticks,
            });
        }
        "item" => {
            let raw: RawItem = entity(x, y, &kind, payload)?;
            snapshot.items.push(Item {
                x,
                y,
                kind: raw.kind,
            });
        }
        _ => return Err(SnapshotError::UnknownEntity { x, y, kind }),
    }
    Ok(())
}

fn entity<T: DeserializeOwned>(
    x: usize,
    y: usize,
    kind: &str,
    payload: Value,
) -> Result<T, SnapshotError> {
    serde_json::from_value(payload).map_err(|source| SnapshotError::Entity {
        x,
        y,
        kind: kind.to_string(),
        source,
    })
}

fn decode_visibility(
    rows: &[String],
    grid_dimension: usize,
) -> Result<Vec<Vec<bool>>, SnapshotError> {
    if rows.len() != grid_dimension {
        return Err(SnapshotError::VisibilityRows {
            expected: grid_dimension,
            actual: rows.len(),
        });
    }
    rows.iter()
        .enumerate()
        .map(|(y, row)| -> Result<Vec<bool>, SnapshotError> {
            let cells = row
                .chars()
                .enumerate()
                .map(|(x, c)| match c {
                    '1' => Ok(true),
                    '0' => Ok(false),
                    found => Err(SnapshotError::VisibilityChar { x, y, found }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if cells.len() != grid_dimension {
                return Err(SnapshotError::VisibilityWidth {
                    y,
                    expected: grid_dimension,
                    actual: cells.len(),
                });
            }
            Ok(cells)
        })
        .collect()
}

fn decode_zone(
    raw: RawZone,
    grid_dimension: usize,
) -> Result<Zone, SnapshotError> {
    let fits = |origin: usize, extent: usize| {
        origin
            .checked_add(extent)
            .is_some_and(|end| end <= grid_dimension)
    };
    if !fits(raw.x, raw.width) || !fits(raw.y, raw.height) {
        return Err(SnapshotError::ZoneOutOfBounds {
            index: raw.index,
            dimension: grid_dimension,
        });
    }
    Ok(Zone {
        index: raw.index,
        x: raw.x,
        y: raw.y,
        width: raw.width,
        height: raw.height,
        status: decode_zone_status(raw.index, raw.status)?,
    })
}

/// Reads the status `type` first, then parses the remaining fields as
/// exactly that arm.
fn decode_zone_status(
    index: u32,
    status: Value,
) -> Result<ZoneStatus, SnapshotError> {
    let bad = |reason: String| SnapshotError::ZoneStatus { index, reason };

    let Value::Object(mut fields) = status else {
        return Err(bad("status is not an object".to_string()));
    };
    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => kind,
        Some(_) => return Err(bad("`type` is not a string".to_string())),
        None => return Err(bad("missing `type`".to_string())),
    };
    let rest = Value::Object(fields);

    fn arm<T: DeserializeOwned>(
        kind: &str,
        rest: Value,
    ) -> Result<T, String> {
        serde_json::from_value(rest).map_err(|e| format!("`{kind}`: {e}"))
    }

    let decoded = match kind.as_str() {
        "neutral" => {
            arm::<NeutralFields>(&kind, rest).map(|_| ZoneStatus::Neutral)
        }
        "beingCaptured" => arm::<BeingCapturedFields>(&kind, rest).map(|f| {
            ZoneStatus::BeingCaptured {
                remaining_ticks: f.remaining_ticks,
                player_id: f.player_id,
            }
        }),
        "captured" => arm::<CapturedFields>(&kind, rest).map(|f| {
            ZoneStatus::Captured {
                player_id: f.player_id,
            }
        }),
        "beingContested" => arm::<BeingContestedFields>(&kind, rest).map(|f| {
            ZoneStatus::BeingContested {
                captured_by_id: f.captured_by_id,
            }
        }),
        "beingRetaken" => arm::<BeingRetakenFields>(&kind, rest).map(|f| {
            ZoneStatus::BeingRetaken {
                remaining_ticks: f.remaining_ticks,
                captured_by_id: f.captured_by_id,
                retaken_by_id: f.retaken_by_id,
            }
        }),
        other => Err(format!("unknown status type `{other}`")),
    };
    decoded.map_err(bad)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// An empty `n`x`n` tile grid.
    fn empty_tiles(n: usize) -> Vec<Vec<Vec<Value>>> {
        vec![vec![Vec::new(); n]; n]
    }

    fn all_visible(n: usize) -> Vec<String> {
        vec!["1".repeat(n); n]
    }

    fn state(tiles: Vec<Vec<Vec<Value>>>, zones: Value, visibility: Vec<String>) -> Value {
        json!({
            "id": "state-1",
            "tick": 42,
            "players": [
                {"id": "p1", "nickname": "alpha", "color": 1, "ping": 12, "score": 3},
                {"id": "p2", "nickname": "bravo", "color": 2}
            ],
            "map": {"tiles": tiles, "zones": zones, "visibility": visibility}
        })
    }

    // =====================================================================
    // Entity grid
    // =====================================================================

    #[test]
    fn test_wall_tank_bullet_fixture() {
        let mut tiles = empty_tiles(4);
        tiles[0][2].push(json!({"type": "wall"}));
        tiles[2][1].push(json!({
            "type": "tank",
            "payload": {
                "ownerId": "p1",
                "direction": "up",
                "turret": {"direction": "right", "bulletCount": 0, "ticksToRegenBullet": 1},
                "health": 100,
                "secondaryItem": "laser"
            }
        }));
        tiles[3][3].push(json!({
            "type": "bullet",
            "payload": {"id": 1, "direction": "down", "speed": 0.5, "type": "basic"}
        }));

        let snap = decode_snapshot(&state(tiles, json!([]), all_visible(4)), 4)
            .unwrap();

        assert_eq!(snap.id, "state-1");
        assert_eq!(snap.tick, 42);
        assert_eq!(snap.walls, vec![Wall { x: 0, y: 2 }]);
        assert_eq!(
            snap.tanks,
            vec![Tank {
                x: 2,
                y: 1,
                owner_id: "p1".into(),
                direction: Direction::Up,
                turret: Turret {
                    direction: Direction::Right,
                    bullet_count: Some(0),
                    ticks_to_regen_bullet: Some(1),
                },
                health: Some(100),
                secondary_item: Some(ItemKind::Laser),
            }]
        );
        assert_eq!(
            snap.bullets,
            vec![Bullet {
                x: 3,
                y: 3,
                id: 1,
                direction: Direction::Down,
                speed: 0.5,
                kind: BulletKind::Basic,
            }]
        );
        assert!(snap.lasers.is_empty());
        assert!(snap.mines.is_empty());
        assert!(snap.items.is_empty());
        assert!(snap.zones.is_empty());
    }

    #[test]
    fn test_enemy_tank_fields_stay_absent() {
        let mut tiles = empty_tiles(3);
        tiles[1][1].push(json!({
            "type": "tank",
            "payload": {"ownerId": "p2", "direction": "left", "turret": {"direction": "left"}}
        }));
        let snap = decode_snapshot(&state(tiles, json!([]), all_visible(3)), 3)
            .unwrap();
        let tank = snap.tank_of("p2").unwrap();
        assert_eq!(tank.health, None);
        assert_eq!(tank.turret.bullet_count, None);
        assert_eq!(tank.turret.ticks_to_regen_bullet, None);
        assert_eq!(tank.secondary_item, None);
    }

    #[test]
    fn test_laser_mine_item_and_shared_cell() {
        let mut tiles = empty_tiles(3);
        tiles[0][0].push(json!({"type": "laser", "payload": {"id": 7, "orientation": "horizontal"}}));
        tiles[0][0].push(json!({"type": "mine", "payload": {"id": 7, "explosionRemainingTicks": 2}}));
        tiles[2][0].push(json!({"type": "item", "payload": {"type": "doubleBullet"}}));
        tiles[1][2].push(json!({"type": "bullet", "payload": {"id": 7, "direction": "up", "speed": 1.0, "type": "doubleBullet"}}));
        let snap = decode_snapshot(&state(tiles, json!([]), all_visible(3)), 3)
            .unwrap();

        assert_eq!(snap.lasers, vec![Laser { x: 0, y: 0, id: 7, orientation: Orientation::Horizontal }]);
        assert_eq!(snap.mines, vec![Mine { x: 0, y: 0, id: 7, explosion_remaining_ticks: Some(2) }]);
        assert_eq!(snap.items, vec![Item { x: 2, y: 0, kind: ItemKind::DoubleBullet }]);
        assert_eq!(snap.bullets[0].kind, BulletKind::Double);
    }

    #[test]
    fn test_unknown_entity_kind_fails_whole_snapshot() {
        let mut tiles = empty_tiles(2);
        tiles[0][0].push(json!({"type": "wall"}));
        tiles[1][0].push(json!({"type": "portal", "payload": {}}));
        let err = decode_snapshot(&state(tiles, json!([]), all_visible(2)), 2)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnknownEntity { x: 1, y: 0, ref kind } if kind == "portal"
        ));
    }

    #[test]
    fn test_entity_missing_field_names_the_cell() {
        let mut tiles = empty_tiles(2);
        tiles[1][1].push(json!({"type": "bullet", "payload": {"id": 1, "direction": "up"}}));
        let err = decode_snapshot(&state(tiles, json!([]), all_visible(2)), 2)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Entity { x: 1, y: 1, .. }));
    }

    #[test]
    fn test_tank_without_payload_fails() {
        let mut tiles = empty_tiles(2);
        tiles[0][1].push(json!({"type": "tank"}));
        let err = decode_snapshot(&state(tiles, json!([]), all_visible(2)), 2)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Entity { x: 0, y: 1, .. }));
    }

    #[test]
    fn test_grid_size_must_match_dimension() {
        let err = decode_snapshot(&state(empty_tiles(3), json!([]), all_visible(4)), 4)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::ColumnCount { expected: 4, actual: 3 }));

        let mut tiles = empty_tiles(3);
        tiles[2].pop();
        let err = decode_snapshot(&state(tiles, json!([]), all_visible(3)), 3)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::CellCount { x: 2, expected: 3, actual: 2 }));
    }

    #[test]
    fn test_not_a_game_state_is_shape_error() {
        let err = decode_snapshot(&json!({"id": "x"}), 3).unwrap_err();
        assert!(matches!(err, SnapshotError::Shape(_)));
    }

    // =====================================================================
    // Visibility
    // =====================================================================

    #[test]
    fn test_visibility_rows_decode_in_order() {
        let vis = vec!["110".to_string(), "011".to_string(), "000".to_string()];
        let snap = decode_snapshot(&state(empty_tiles(3), json!([]), vis), 3)
            .unwrap();
        assert_eq!(
            snap.visibility,
            vec![
                vec![true, true, false],
                vec![false, true, true],
                vec![false, false, false],
            ]
        );
        assert!(snap.is_visible(1, 0));
        assert!(!snap.is_visible(0, 1));
        assert!(!snap.is_visible(9, 9));
    }

    #[test]
    fn test_visibility_wrong_row_count() {
        let vis = vec!["11".to_string()];
        let err = decode_snapshot(&state(empty_tiles(2), json!([]), vis), 2)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::VisibilityRows { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_visibility_wrong_row_width() {
        let vis = vec!["11".to_string(), "1".to_string()];
        let err = decode_snapshot(&state(empty_tiles(2), json!([]), vis), 2)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::VisibilityWidth { y: 1, .. }));
    }

    #[test]
    fn test_visibility_bad_character() {
        let vis = vec!["10".to_string(), "1x".to_string()];
        let err = decode_snapshot(&state(empty_tiles(2), json!([]), vis), 2)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::VisibilityChar { x: 1, y: 1, found: 'x' }));
    }

    // =====================================================================
    // Zones
    // =====================================================================

    fn zone(status: Value) -> Value {
        json!([{"index": 65, "x": 1, "y": 1, "width": 2, "height": 2, "status": status}])
    }

    fn decode_one_zone(status: Value) -> Result<Zone, SnapshotError> {
        decode_snapshot(&state(empty_tiles(4), zone(status), all_visible(4)), 4)
            .map(|mut snap| snap.zones.remove(0))
    }

    #[test]
    fn test_zone_every_arm() {
        let cases = [
            (json!({"type": "neutral"}), ZoneStatus::Neutral),
            (
                json!({"type": "beingCaptured", "remainingTicks": 100, "playerId": "p1"}),
                ZoneStatus::BeingCaptured { remaining_ticks: 100, player_id: "p1".into() },
            ),
            (
                json!({"type": "captured", "playerId": "p2"}),
                ZoneStatus::Captured { player_id: "p2".into() },
            ),
            (
                json!({"type": "beingContested"}),
                ZoneStatus::BeingContested { captured_by_id: None },
            ),
            (
                json!({"type": "beingContested", "capturedById": "p1"}),
                ZoneStatus::BeingContested { captured_by_id: Some("p1".into()) },
            ),
            (
                json!({"type": "beingRetaken", "remainingTicks": 5, "capturedById": "p1", "retakenById": "p2"}),
                ZoneStatus::BeingRetaken {
                    remaining_ticks: 5,
                    captured_by_id: "p1".into(),
                    retaken_by_id: "p2".into(),
                },
            ),
        ];
        for (wire, expected) in cases {
            let declared = wire["type"].as_str().unwrap().to_string();
            let zone = decode_one_zone(wire).unwrap();
            assert_eq!(zone.status, expected);
            assert_eq!(zone.status.kind(), declared);
        }
    }

    #[test]
    fn test_zone_geometry() {
        let zone = decode_one_zone(json!({"type": "neutral"})).unwrap();
        assert_eq!(zone.index, 65);
        assert!(zone.contains(1, 1));
        assert!(zone.contains(2, 2));
        assert!(!zone.contains(3, 1));
        assert_eq!(zone.status.owner(), None);
    }

    #[test]
    fn test_zone_at_the_edge_of_usize_does_not_overflow() {
        let zone = Zone {
            index: 66,
            x: usize::MAX - 1,
            y: usize::MAX - 1,
            width: 10,
            height: 10,
            status: ZoneStatus::Neutral,
        };
        assert!(zone.contains(usize::MAX - 1, usize::MAX - 1));
        assert!(!zone.contains(0, 0));
        assert!(!zone.contains(usize::MAX - 2, usize::MAX - 1));
    }

    #[test]
    fn test_zone_type_contradicting_fields_fails() {
        // Declares `captured` but carries the `beingRetaken` fields.
        let err = decode_one_zone(json!({
            "type": "captured",
            "playerId": "p1",
            "retakenById": "p2"
        }))
        .unwrap_err();
        assert!(matches!(err, SnapshotError::ZoneStatus { index: 65, .. }));
    }

    #[test]
    fn test_zone_neutral_with_fields_fails() {
        let err = decode_one_zone(json!({"type": "neutral", "playerId": "p1"}))
            .unwrap_err();
        assert!(matches!(err, SnapshotError::ZoneStatus { .. }));
    }

    #[test]
    fn test_zone_unknown_status_type_fails() {
        let err = decode_one_zone(json!({"type": "exploded"})).unwrap_err();
        assert!(matches!(err, SnapshotError::ZoneStatus { .. }));
    }

    #[test]
    fn test_zone_missing_arm_field_fails() {
        let err = decode_one_zone(json!({"type": "beingCaptured", "playerId": "p1"}))
            .unwrap_err();
        assert!(matches!(err, SnapshotError::ZoneStatus { .. }));
    }

    #[test]
    fn test_zone_outside_grid_fails() {
        let zones = json!([{"index": 66, "x": 3, "y": 0, "width": 2, "height": 1, "status": {"type": "neutral"}}]);
        let err = decode_snapshot(&state(empty_tiles(4), zones, all_visible(4)), 4)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::ZoneOutOfBounds { index: 66, dimension: 4 }));
    }

    // =====================================================================
    // Roster
    // =====================================================================

    #[test]
    fn test_roster_optional_fields_stay_absent() {
        let snap = decode_snapshot(&state(empty_tiles(2), json!([]), all_visible(2)), 2)
            .unwrap();
        let p1 = snap.player("p1").unwrap();
        assert_eq!(p1.ping, Some(12));
        assert_eq!(p1.score, Some(3));
        assert_eq!(p1.ticks_to_regen, None);

        let p2 = snap.player("p2").unwrap();
        assert_eq!(p2.ping, None);
        assert_eq!(p2.score, None);
        assert_eq!(p2.is_using_radar, None);
    }
}
