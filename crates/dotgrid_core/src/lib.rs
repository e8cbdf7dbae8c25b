//! Authoritative game engine for multiplayer Dots-and-Boxes.
//!
//! This crate owns the state of one match: the claimed edges, completed
//! boxes, scores, turn pointer, and lifecycle status. All mutation goes
//! through three operations — [`Game::add_player`], [`Game::attempt_move`],
//! and [`Game::remove_player`] — each of which either applies fully or
//! leaves the state untouched. Outward-visible state is derived on demand
//! as an owned [`GameSnapshot`].
//!
//! The crate is transport-free: no I/O, no async, no timers. Room lookup
//! and broadcast live in the server crate.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod edge;
mod game;
mod types;

pub use edge::{BoxCoord, Dot, Edge, EdgeError};
pub use game::{Game, JoinError, MoveError, MoveOutcome, MIN_GRID_SIZE};
pub use types::{GameSnapshot, GameStatus, Player, PlayerId, Seat, Winner};
