//! Room directory: the room-id to game mapping shared across connections.

use crate::protocol::ServerMessage;
use crate::room_id::RoomId;
use derive_more::{Display, Error};
use dotgrid_core::{Game, GameSnapshot, GameStatus, JoinError, MIN_GRID_SIZE, PlayerId, Seat};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Outbound channel for one connected peer.
pub type PeerSender = mpsc::UnboundedSender<ServerMessage>;

/// Why a directory operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum DirectoryError {
    /// No room with the given id exists.
    #[display("room not found")]
    RoomNotFound,
    /// Both seats in the room are taken.
    #[display("room is full")]
    RoomFull,
    /// Requested grid size is outside the configured bounds.
    #[display("grid size must be between {min} and {max}")]
    InvalidGridSize {
        /// Smallest accepted grid.
        min: u32,
        /// Largest accepted grid.
        max: u32,
    },
}

impl From<JoinError> for DirectoryError {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::RoomFull => DirectoryError::RoomFull,
        }
    }
}

/// One live room: the game plus the transport bookkeeping for it.
///
/// The game mutex serializes every engine operation for the room, so of
/// two racing moves the second always validates against the effect of
/// the first. The peer registry fans broadcast messages out to the
/// connected sockets.
#[derive(Debug)]
pub struct Room {
    game: Mutex<Game>,
    peers: Mutex<HashMap<PlayerId, PeerSender>>,
    last_activity: Mutex<Instant>,
}

impl Room {
    fn new(game: Game) -> Self {
        Self {
            game: Mutex::new(game),
            peers: Mutex::new(HashMap::new()),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Runs one engine operation under the room lock.
    pub fn with_game<T>(&self, op: impl FnOnce(&mut Game) -> T) -> T {
        let mut game = self.game.lock().unwrap();
        *self.last_activity.lock().unwrap() = Instant::now();
        op(&mut game)
    }

    /// Takes a snapshot without refreshing the activity clock.
    pub fn snapshot(&self) -> GameSnapshot {
        self.game.lock().unwrap().snapshot()
    }

    /// Registers a peer's outbound channel for broadcasts.
    pub fn attach_peer(&self, player_id: &str, sender: PeerSender) {
        self.peers
            .lock()
            .unwrap()
            .insert(player_id.to_string(), sender);
        *self.last_activity.lock().unwrap() = Instant::now();
    }

    /// Drops a peer's outbound channel.
    pub fn detach_peer(&self, player_id: &str) {
        self.peers.lock().unwrap().remove(player_id);
    }

    /// Number of peers currently attached.
    pub fn peer_count(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    /// Sends a message to every attached peer, pruning closed channels.
    pub fn broadcast(&self, message: &ServerMessage) {
        let mut peers = self.peers.lock().unwrap();
        peers.retain(|player_id, sender| {
            let delivered = sender.send(message.clone()).is_ok();
            if !delivered {
                debug!(player_id, "dropping closed peer channel");
            }
            delivered
        });
    }

    fn evictable(&self, ttl: Duration) -> bool {
        if self.last_activity.lock().unwrap().elapsed() < ttl {
            return false;
        }
        let finished = self.game.lock().unwrap().status() == GameStatus::Finished;
        finished || self.peers.lock().unwrap().is_empty()
    }
}

/// Maps room ids to live rooms.
///
/// The map mutex is the only cross-room shared state; each room locks
/// independently, so traffic in one room never blocks another. The
/// directory is a plain value — tests construct isolated instances.
#[derive(Debug)]
pub struct RoomDirectory {
    rooms: Mutex<HashMap<RoomId, Arc<Room>>>,
    min_grid_size: u32,
    max_grid_size: u32,
}

impl RoomDirectory {
    /// Creates a directory accepting grids up to `max_grid_size` dots.
    pub fn new(max_grid_size: u32) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            min_grid_size: MIN_GRID_SIZE,
            max_grid_size,
        }
    }

    /// Creates a room, seating `player_id` as P1.
    ///
    /// The fresh id is drawn and reserved under the map lock, so two
    /// concurrent creates can never register the same id.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::InvalidGridSize`] when the requested grid is
    /// outside the configured bounds.
    #[instrument(skip(self))]
    pub fn create_room(
        &self,
        player_id: &str,
        grid_size: u32,
    ) -> Result<(RoomId, Arc<Room>), DirectoryError> {
        if grid_size < self.min_grid_size || grid_size > self.max_grid_size {
            warn!(grid_size, "rejected grid size");
            return Err(DirectoryError::InvalidGridSize {
                min: self.min_grid_size,
                max: self.max_grid_size,
            });
        }
        let mut rooms = self.rooms.lock().unwrap();
        let mut rng = rand::rng();
        let room_id = loop {
            let candidate = RoomId::generate(&mut rng);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let mut game = Game::new(room_id.as_str(), grid_size);
        // Seating the creator in a brand-new room cannot fail.
        let _ = game.add_player(player_id);
        let room = Arc::new(Room::new(game));
        rooms.insert(room_id.clone(), Arc::clone(&room));
        info!(room_id = %room_id, grid_size, "room created");
        Ok((room_id, room))
    }

    /// Joins an existing room.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::RoomNotFound`] when no such id is registered —
    /// distinct from [`DirectoryError::RoomFull`], which means the room
    /// exists but both seats are taken.
    #[instrument(skip(self), fields(room_id = %room_id))]
    pub fn join_room(
        &self,
        room_id: &RoomId,
        player_id: &str,
    ) -> Result<(Arc<Room>, Seat), DirectoryError> {
        let room = self.get(room_id).ok_or(DirectoryError::RoomNotFound)?;
        let seat = room.with_game(|game| game.add_player(player_id))?;
        debug!(seat = %seat, "player joined");
        Ok((room, seat))
    }

    /// Looks up a room.
    pub fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.lock().unwrap().get(room_id).cloned()
    }

    /// Removes a room outright.
    pub fn remove(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.lock().unwrap().remove(room_id)
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }

    /// True when no rooms are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts rooms idle past `ttl` that are finished or have no peers.
    ///
    /// A waiting room with an attached peer is never collected from
    /// under them. Returns the number of rooms removed.
    #[instrument(skip(self))]
    pub fn sweep(&self, ttl: Duration) -> usize {
        let mut rooms = self.rooms.lock().unwrap();
        let before = rooms.len();
        rooms.retain(|room_id, room| {
            let evict = room.evictable(ttl);
            if evict {
                info!(room_id = %room_id, "evicting idle room");
            }
            !evict
        });
        before - rooms.len()
    }
}
