//! Conversions between algebraic square names and zero-based board indices.
//!
//! Indices are `(file_index, rank_index)` with `(0, 0)` at a1. Display code
//! draws from the top-left, so `reverse_y_index` and `orient_indices` map
//! between the two coordinate systems.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::chess::{Player, SquareColor};
use crate::error::{ChessError, ChessResult};

/// Number of files and ranks on a standard board
pub const BOARD_SIZE: usize = 8;

pub const FILES: [char; BOARD_SIZE] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
pub const RANKS: [char; BOARD_SIZE] = ['1', '2', '3', '4', '5', '6', '7', '8'];

/// A `(file_index, rank_index)` pair
pub type Indices = (usize, usize);

/// An algebraic coordinate such as `e4`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Build a square from indices, rejecting anything off the board
    pub fn from_indices((file, rank): Indices) -> ChessResult<Square> {
        validate_indices((file, rank))?;
        Ok(Square {
            file: file as u8,
            rank: rank as u8,
        })
    }

    /// Both parts must already be below `BOARD_SIZE`
    pub(crate) const fn from_parts(file: u8, rank: u8) -> Square {
        Square { file, rank }
    }

    pub fn indices(self) -> Indices {
        (self.file as usize, self.rank as usize)
    }

    pub fn file_index(self) -> usize {
        self.file as usize
    }

    pub fn rank_index(self) -> usize {
        self.rank as usize
    }

    /// All 64 squares, file-major (a1, a2, ..., h8)
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|file| {
            (0..BOARD_SIZE).map(move |rank| Square {
                file: file as u8,
                rank: rank as u8,
            })
        })
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChessError::InvalidSquare {
            square: s.to_string(),
        };

        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };

        let file = FILES.iter().position(|&f| f == file).ok_or_else(invalid)?;
        let rank = RANKS.iter().position(|&r| r == rank).ok_or_else(invalid)?;

        Ok(Square {
            file: file as u8,
            rank: rank as u8,
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", FILES[self.file_index()], RANKS[self.rank_index()])
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for Square {
    fn schema_name() -> Cow<'static, str> {
        "Square".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^[a-h][1-8]$"
        })
    }
}

fn validate_indices((file, rank): Indices) -> ChessResult<()> {
    if file >= BOARD_SIZE || rank >= BOARD_SIZE {
        return Err(ChessError::IndexOutOfBounds { file, rank });
    }
    Ok(())
}

fn reverse_index(index: usize) -> usize {
    BOARD_SIZE - 1 - index
}

/// Convert a square name such as `"e4"` to `(4, 3)`
pub fn square_to_indices(square: &str) -> ChessResult<Indices> {
    square.parse::<Square>().map(Square::indices)
}

/// Convert `(file_index, rank_index)` back to a square
pub fn indices_to_square(indices: Indices) -> ChessResult<Square> {
    Square::from_indices(indices)
}

/// Flip the rank index only.
///
/// SVG coordinates grow downwards while ranks grow upwards.
pub fn reverse_y_index(indices: Indices) -> ChessResult<Indices> {
    validate_indices(indices)?;
    let (file, rank) = indices;
    Ok((file, reverse_index(rank)))
}

/// Rotate the indices 180 degrees when the board is seen from black's side
pub fn orient_indices(indices: Indices, orientation: Player) -> ChessResult<Indices> {
    validate_indices(indices)?;
    let (file, rank) = indices;
    Ok(match orientation {
        Player::White => (file, rank),
        Player::Black => (reverse_index(file), reverse_index(rank)),
    })
}

/// Returns true if going from `from` to `to` is a knight's jump
pub fn is_knight_move(from: Square, to: Square) -> bool {
    let dx = from.file_index().abs_diff(to.file_index());
    let dy = from.rank_index().abs_diff(to.rank_index());
    (dx == 1 && dy == 2) || (dx == 2 && dy == 1)
}

/// Light or dark, by parity of the index sum (a1 is dark)
pub fn square_color(square: Square) -> SquareColor {
    let (file, rank) = square.indices();
    if (file + rank) % 2 == 0 {
        SquareColor::Dark
    } else {
        SquareColor::Light
    }
}
