//! The per-room game state machine.

use crate::edge::{BoxCoord, Dot, Edge, EdgeError};
use crate::types::{GameSnapshot, GameStatus, Player, PlayerId, Seat, Winner};
use derive_more::{Display, Error};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

/// Smallest playable board: two dots per side, one box.
pub const MIN_GRID_SIZE: u32 = 2;

/// Why a join attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum JoinError {
    /// Both seats are taken by other players.
    #[display("room already has two players")]
    RoomFull,
}

/// Why a move was rejected.
///
/// Variants are listed in validation order; the first failing check wins
/// and the game is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The game is waiting for players or already finished.
    #[display("game is not active")]
    GameNotActive,
    /// The mover does not hold the current turn.
    #[display("not your turn")]
    NotYourTurn,
    /// The submitted dots do not form an in-bounds adjacent edge.
    #[display("invalid edge: {_0}")]
    InvalidEdge(EdgeError),
    /// The edge was already claimed.
    #[display("edge already claimed")]
    EdgeTaken,
}

/// Result of a successful move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Boxes completed by this move: 0, 1, or 2.
    pub completed_boxes: u32,
    /// Player who moves next (the mover again after a capture).
    pub next_turn: PlayerId,
}

/// Authoritative state of one match.
///
/// The edge set only grows, box ownership is write-once, and the score
/// sum always equals the number of claimed boxes. A `Finished` game is
/// never transitioned back.
#[derive(Debug, Clone)]
pub struct Game {
    id: String,
    grid_size: u32,
    players: Vec<Player>,
    edges: BTreeSet<Edge>,
    boxes: BTreeMap<BoxCoord, PlayerId>,
    scores: BTreeMap<PlayerId, u32>,
    current_turn: Seat,
    status: GameStatus,
    winner: Option<Winner>,
}

impl Game {
    /// Creates an empty waiting game.
    ///
    /// Grid bounds are the caller's concern; the engine expects
    /// `grid_size >= MIN_GRID_SIZE`.
    pub fn new(id: impl Into<String>, grid_size: u32) -> Self {
        Self {
            id: id.into(),
            grid_size,
            players: Vec::new(),
            edges: BTreeSet::new(),
            boxes: BTreeMap::new(),
            scores: BTreeMap::new(),
            current_turn: Seat::P1,
            status: GameStatus::Waiting,
            winner: None,
        }
    }

    /// Room identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dots per side.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Seated players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Total boxes on this board: `(grid_size - 1)²`.
    pub fn total_boxes(&self) -> u32 {
        let per_side = self.grid_size - 1;
        per_side * per_side
    }

    /// Boxes claimed so far.
    pub fn claimed_boxes(&self) -> u32 {
        self.boxes.len() as u32
    }

    /// The player holding the current turn, when that seat is filled.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.seat == self.current_turn)
    }

    /// Seats a player, or refreshes their liveness if already seated.
    ///
    /// The second join starts the game with the turn on P1.
    ///
    /// # Errors
    ///
    /// [`JoinError::RoomFull`] when both seats belong to other players.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn add_player(&mut self, player_id: &str) -> Result<Seat, JoinError> {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            debug!(seat = %player.seat, "player re-joined");
            player.connected = true;
            return Ok(player.seat);
        }
        if self.players.len() >= 2 {
            return Err(JoinError::RoomFull);
        }
        let seat = if self.players.is_empty() {
            Seat::P1
        } else {
            Seat::P2
        };
        self.players.push(Player {
            id: player_id.to_string(),
            seat,
            connected: true,
        });
        self.scores.insert(player_id.to_string(), 0);
        if self.players.len() == 2 {
            self.status = GameStatus::Playing;
            self.current_turn = Seat::P1;
            info!("both seats filled, game started");
        }
        Ok(seat)
    }

    /// Removes a seated player.
    ///
    /// A departure mid-game ends the match immediately with no winner.
    /// Before the game starts the seat is simply vacated. A finished game
    /// is terminal, so departure there only clears the liveness flag.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn remove_player(&mut self, player_id: &str) {
        match self.status {
            GameStatus::Finished => {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
                    player.connected = false;
                }
            }
            GameStatus::Playing => {
                let before = self.players.len();
                self.players.retain(|p| p.id != player_id);
                if self.players.len() < before {
                    info!("player departed mid-game, finishing");
                    self.status = GameStatus::Finished;
                }
            }
            GameStatus::Waiting => {
                self.players.retain(|p| p.id != player_id);
                self.scores.remove(player_id);
            }
        }
    }

    /// Validates and applies a move.
    ///
    /// On success the canonical edge is claimed, any boxes completed by
    /// it are assigned to the mover, and the turn passes unless at least
    /// one box was captured. Claiming the last box finishes the game and
    /// decides the winner.
    ///
    /// # Errors
    ///
    /// [`MoveError`], checked in declaration order; every failure leaves
    /// the game unchanged.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn attempt_move(
        &mut self,
        player_id: &str,
        from: Dot,
        to: Dot,
    ) -> Result<MoveOutcome, MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::GameNotActive);
        }
        let mover = self
            .current_player()
            .map(|p| p.id.clone())
            .ok_or(MoveError::GameNotActive)?;
        if mover != player_id {
            return Err(MoveError::NotYourTurn);
        }
        let edge = Edge::checked(from, to, self.grid_size).map_err(MoveError::InvalidEdge)?;
        if self.edges.contains(&edge) {
            return Err(MoveError::EdgeTaken);
        }

        self.edges.insert(edge);
        let completed = self.claim_adjacent_boxes(edge, player_id);
        if completed > 0 {
            if let Some(score) = self.scores.get_mut(player_id) {
                *score += completed;
            }
            debug!(completed, "capture, mover keeps the turn");
        } else {
            self.current_turn = self.current_turn.other();
        }
        self.finish_if_complete();

        let next_turn = self
            .current_player()
            .map(|p| p.id.clone())
            .unwrap_or(mover);
        Ok(MoveOutcome {
            completed_boxes: completed,
            next_turn,
        })
    }

    /// Claims the at-most-two boxes adjacent to a freshly inserted edge.
    ///
    /// Only boxes touching the new edge can have become complete, so the
    /// check is constant-time per move. A candidate outside the board is
    /// skipped; a candidate is complete iff all four bounding edges are
    /// present.
    fn claim_adjacent_boxes(&mut self, edge: Edge, player_id: &str) -> u32 {
        let Dot { x, y } = edge.a();
        let candidates = if edge.is_horizontal() {
            [BoxCoord::new(x, y - 1), BoxCoord::new(x, y)]
        } else {
            [BoxCoord::new(x - 1, y), BoxCoord::new(x, y)]
        };
        let mut completed = 0;
        for candidate in candidates {
            if !candidate.in_bounds(self.grid_size) {
                continue;
            }
            if candidate
                .bounding_edges()
                .iter()
                .all(|e| self.edges.contains(e))
            {
                self.boxes.insert(candidate, player_id.to_string());
                completed += 1;
            }
        }
        completed
    }

    fn finish_if_complete(&mut self) {
        if self.claimed_boxes() < self.total_boxes() {
            return;
        }
        self.status = GameStatus::Finished;
        self.winner = self.decide_winner();
        info!(winner = ?self.winner, "all boxes claimed");
    }

    fn decide_winner(&self) -> Option<Winner> {
        let [first, second] = match self.players.as_slice() {
            [a, b] => [a, b],
            _ => return None,
        };
        let score =
            |player: &Player| self.scores.get(&player.id).copied().unwrap_or_default();
        match score(first).cmp(&score(second)) {
            Ordering::Greater => Some(Winner::Player(first.id.clone())),
            Ordering::Less => Some(Winner::Player(second.id.clone())),
            Ordering::Equal => Some(Winner::Draw),
        }
    }

    /// Builds an independent snapshot of the current state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            room_id: self.id.clone(),
            players: self.players.clone(),
            grid_size: self.grid_size,
            edges: self.edges.iter().map(Edge::to_string).collect(),
            boxes: self
                .boxes
                .iter()
                .map(|(coord, owner)| (coord.to_string(), owner.clone()))
                .collect(),
            scores: self.scores.clone(),
            current_turn: self.current_player().map(|p| p.id.clone()),
            winner: self.winner.clone(),
            status: self.status,
        }
    }
}
