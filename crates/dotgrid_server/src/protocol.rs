//! JSON wire protocol spoken over the WebSocket.

use crate::directory::DirectoryError;
use crate::room_id::RoomId;
use dotgrid_core::{GameSnapshot, MoveError};
use serde::{Deserialize, Serialize};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room and take the first seat.
    CreateRoom {
        /// Dots per side; the server default applies when omitted.
        #[serde(default)]
        grid_size: Option<u32>,
    },
    /// Take a seat in an existing room.
    JoinRoom {
        /// Target room id (case-insensitive).
        room_id: String,
    },
    /// Claim an edge.
    MakeMove {
        /// Target room id.
        room_id: String,
        /// The edge's two endpoints, in either order.
        edge: EdgeCoords,
    },
    /// Give up the seat without closing the connection.
    LeaveRoom {
        /// Target room id.
        room_id: String,
    },
}

/// Wire form of an edge: two dot coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCoords {
    /// First endpoint column.
    pub x1: i32,
    /// First endpoint row.
    pub y1: i32,
    /// Second endpoint column.
    pub x2: i32,
    /// Second endpoint row.
    pub y2: i32,
}

/// Messages the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `create_room`.
    RoomCreated {
        /// The fresh room id.
        room_id: RoomId,
        /// Initial snapshot: one seat filled, status waiting.
        state: GameSnapshot,
    },
    /// Reply to `join_room`.
    RoomJoined {
        /// Snapshot at join time.
        state: GameSnapshot,
    },
    /// Broadcast to every room peer on any state change.
    GameUpdate {
        /// Fresh snapshot.
        state: GameSnapshot,
    },
    /// Sent only to the caller whose request failed.
    Error {
        /// Machine-readable failure class.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },
}

impl ServerMessage {
    /// Builds the error reply for a failed directory call.
    pub fn from_directory_error(err: DirectoryError) -> Self {
        ServerMessage::Error {
            code: ErrorCode::from(&err),
            message: err.to_string(),
        }
    }

    /// Builds the error reply for a rejected move.
    pub fn from_move_error(err: MoveError) -> Self {
        ServerMessage::Error {
            code: ErrorCode::from(&err),
            message: err.to_string(),
        }
    }

    /// Builds the reply for a frame the server could not parse.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: ErrorCode::BadRequest,
            message: message.into(),
        }
    }
}

/// Failure classes surfaced to clients.
///
/// Every engine and directory failure maps onto exactly one code; all
/// are recoverable and none ends the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    /// No room with the requested id.
    RoomNotFound,
    /// Both seats are taken.
    RoomFull,
    /// Grid size outside the configured bounds.
    InvalidGridSize,
    /// The game is waiting or finished.
    GameNotActive,
    /// Caller does not hold the turn.
    NotYourTurn,
    /// The dots do not form an in-bounds adjacent edge.
    InvalidEdge,
    /// The edge is already claimed.
    EdgeTaken,
    /// The frame could not be parsed.
    BadRequest,
}

impl From<&DirectoryError> for ErrorCode {
    fn from(err: &DirectoryError) -> Self {
        match err {
            DirectoryError::RoomNotFound => ErrorCode::RoomNotFound,
            DirectoryError::RoomFull => ErrorCode::RoomFull,
            DirectoryError::InvalidGridSize { .. } => ErrorCode::InvalidGridSize,
        }
    }
}

impl From<&MoveError> for ErrorCode {
    fn from(err: &MoveError) -> Self {
        match err {
            MoveError::GameNotActive => ErrorCode::GameNotActive,
            MoveError::NotYourTurn => ErrorCode::NotYourTurn,
            MoveError::InvalidEdge(_) => ErrorCode::InvalidEdge,
            MoveError::EdgeTaken => ErrorCode::EdgeTaken,
        }
    }
}
