//! Real-time multiplayer Dots-and-Boxes server.
//!
//! The authoritative rules live in [`dotgrid_core`]; this crate wraps
//! them in everything a running service needs:
//!
//! - **Room directory**: the room-id to game mapping, with one lock per
//!   room so operations on a room serialize while rooms stay independent.
//! - **Protocol**: tagged JSON messages spoken over a WebSocket.
//! - **Transport**: an axum `/ws` endpoint; every state change is pushed
//!   to all peers of the room as a fresh snapshot, errors go only to the
//!   offending caller.
//! - **Eviction**: a background sweep that drops finished or abandoned
//!   rooms after a configurable idle period.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cli;
mod config;
mod directory;
mod protocol;
mod room_id;
mod server;

pub use cli::Cli;
pub use config::{ConfigError, ServerConfig};
pub use directory::{DirectoryError, PeerSender, Room, RoomDirectory};
pub use protocol::{ClientMessage, EdgeCoords, ErrorCode, ServerMessage};
pub use room_id::{ROOM_ID_ALPHABET, ROOM_ID_LEN, RoomId, RoomIdError};
pub use server::{AppState, router, run};
