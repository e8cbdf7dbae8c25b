//! Short, human-typeable room identifiers.

use derive_more::{Display, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters a room id may contain.
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every room id.
pub const ROOM_ID_LEN: usize = 6;

/// Room identifier: [`ROOM_ID_LEN`] characters of `A-Z0-9`.
///
/// Parsing is case-insensitive; ids are stored and displayed uppercase,
/// so whatever casing a player types resolves to the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Parses and normalizes an id, accepting any letter case.
    ///
    /// # Errors
    ///
    /// [`RoomIdError`] for a wrong length or a character outside the
    /// alphabet.
    pub fn parse(value: &str) -> Result<Self, RoomIdError> {
        if value.len() != ROOM_ID_LEN {
            return Err(RoomIdError::InvalidLength {
                expected: ROOM_ID_LEN,
                found: value.len(),
            });
        }
        let mut normalized = String::with_capacity(ROOM_ID_LEN);
        for (index, ch) in value.chars().enumerate() {
            let upper = ch.to_ascii_uppercase();
            if !upper.is_ascii() || !ROOM_ID_ALPHABET.contains(&(upper as u8)) {
                return Err(RoomIdError::InvalidCharacter { ch, index });
            }
            normalized.push(upper);
        }
        Ok(Self(normalized))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Draws a fresh random id.
    ///
    /// Uniqueness against live rooms is the directory's responsibility;
    /// it retries under its map lock until the id is unused.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = (0..ROOM_ID_LEN)
            .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

/// Why a string is not a valid room id.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RoomIdError {
    /// Wrong number of characters.
    #[display("room id must be {expected} characters, got {found}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
    /// A character outside the alphabet.
    #[display("invalid character '{ch}' at position {index}")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// Its position in the input.
        index: usize,
    },
}
