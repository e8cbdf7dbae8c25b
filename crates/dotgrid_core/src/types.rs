//! Domain types shared between the engine and its consumers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Opaque connection-scoped player identifier.
pub type PlayerId = String;

/// Fixed seat label for one of the two players.
///
/// Seats are assigned in join order and never change for the life of the
/// game, independent of connection churn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Seat {
    /// First player to join; moves first.
    P1,
    /// Second player to join.
    P2,
}

impl Seat {
    /// The opposite seat.
    pub fn other(self) -> Self {
        match self {
            Seat::P1 => Seat::P2,
            Seat::P2 => Seat::P1,
        }
    }
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Connection-scoped identity.
    pub id: PlayerId,
    /// Permanent seat label.
    pub seat: Seat,
    /// Liveness flag, refreshed by the idempotent re-join path.
    pub connected: bool,
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Fewer than two players have joined.
    Waiting,
    /// Two players joined and boxes remain unclaimed.
    Playing,
    /// All boxes claimed, or a player departed mid-game.
    Finished,
}

/// Outcome of a game that finished with all boxes claimed.
///
/// Serialized as the winning player's id, or the literal string `"draw"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Winner {
    /// The seat with the strictly higher score.
    Player(PlayerId),
    /// Equal scores after the last box.
    Draw,
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Winner::Player(id) => serializer.serialize_str(id),
            Winner::Draw => serializer.serialize_str("draw"),
        }
    }
}

impl<'de> Deserialize<'de> for Winner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "draw" {
            Ok(Winner::Draw)
        } else {
            Ok(Winner::Player(raw))
        }
    }
}

/// Point-in-time projection of a game, broadcast to clients.
///
/// Every call to [`crate::Game::snapshot`] returns an independent value;
/// mutating the engine afterwards never changes a snapshot already taken.
/// Field names follow the wire format: camelCase keys, edges as sorted
/// canonical strings, boxes keyed by their top-left dot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Room identifier.
    pub room_id: String,
    /// Seated players in join order.
    pub players: Vec<Player>,
    /// Dots per side.
    pub grid_size: u32,
    /// Claimed edges as canonical strings.
    pub edges: Vec<String>,
    /// Completed boxes: top-left dot string to owner id.
    pub boxes: BTreeMap<String, PlayerId>,
    /// Box count per player id.
    pub scores: BTreeMap<PlayerId, u32>,
    /// Id of the player whose turn it is, when that seat is filled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<PlayerId>,
    /// Present only when the game finished with all boxes claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    /// Lifecycle status.
    pub status: GameStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_serializes_to_player_id_or_draw() {
        let won = serde_json::to_value(Winner::Player("conn-abc".into())).unwrap();
        assert_eq!(won, serde_json::json!("conn-abc"));
        let draw = serde_json::to_value(Winner::Draw).unwrap();
        assert_eq!(draw, serde_json::json!("draw"));
    }

    #[test]
    fn winner_round_trips() {
        let parsed: Winner = serde_json::from_str("\"draw\"").unwrap();
        assert_eq!(parsed, Winner::Draw);
        let parsed: Winner = serde_json::from_str("\"conn-xyz\"").unwrap();
        assert_eq!(parsed, Winner::Player("conn-xyz".into()));
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_value(GameStatus::Waiting).unwrap(),
            serde_json::json!("waiting")
        );
        assert_eq!(GameStatus::Playing.to_string(), "playing");
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let snapshot = GameSnapshot {
            room_id: "ABC123".into(),
            players: vec![Player {
                id: "conn-1".into(),
                seat: Seat::P1,
                connected: true,
            }],
            grid_size: 5,
            edges: vec!["0,0-1,0".into()],
            boxes: BTreeMap::new(),
            scores: BTreeMap::from([("conn-1".into(), 0)]),
            current_turn: Some("conn-1".into()),
            winner: None,
            status: GameStatus::Waiting,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["roomId"], "ABC123");
        assert_eq!(value["gridSize"], 5);
        assert_eq!(value["currentTurn"], "conn-1");
        assert_eq!(value["players"][0]["seat"], "P1");
        assert!(value.get("winner").is_none());
    }
}
