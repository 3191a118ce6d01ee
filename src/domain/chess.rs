//! Pure chess vocabulary shared by the codecs and the game state engine.
//! No engine dependencies - this is the domain layer.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::squares::Square;

/// The side a piece belongs to
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    White,
    Black,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::White, Player::Black];

    /// The player who moves next after this one
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// The side-to-move letter used in FEN
    pub fn fen_char(self) -> char {
        match self {
            Player::White => 'w',
            Player::Black => 'b',
        }
    }

    pub fn from_fen_char(c: char) -> Option<Player> {
        match c {
            'w' => Some(Player::White),
            'b' => Some(Player::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "white"),
            Player::Black => write!(f, "black"),
        }
    }
}

/// A chess piece kind, without an owner
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Piece {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::King,
        Piece::Queen,
        Piece::Rook,
        Piece::Bishop,
        Piece::Knight,
        Piece::Pawn,
    ];
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Piece::King => "king",
            Piece::Queen => "queen",
            Piece::Rook => "rook",
            Piece::Bishop => "bishop",
            Piece::Knight => "knight",
            Piece::Pawn => "pawn",
        };
        f.write_str(name)
    }
}

/// A piece together with its owner, e.g. `whiteKing`.
///
/// These are value tags: a board cell holds at most one of them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlayerPiece {
    WhiteKing,
    WhiteQueen,
    WhiteRook,
    WhiteBishop,
    WhiteKnight,
    WhitePawn,
    BlackKing,
    BlackQueen,
    BlackRook,
    BlackBishop,
    BlackKnight,
    BlackPawn,
}

/// FEN piece letters and the player pieces they stand for
const FEN_PIECES: [(char, PlayerPiece); 12] = [
    ('k', PlayerPiece::BlackKing),
    ('q', PlayerPiece::BlackQueen),
    ('r', PlayerPiece::BlackRook),
    ('b', PlayerPiece::BlackBishop),
    ('n', PlayerPiece::BlackKnight),
    ('p', PlayerPiece::BlackPawn),
    ('K', PlayerPiece::WhiteKing),
    ('Q', PlayerPiece::WhiteQueen),
    ('R', PlayerPiece::WhiteRook),
    ('B', PlayerPiece::WhiteBishop),
    ('N', PlayerPiece::WhiteKnight),
    ('P', PlayerPiece::WhitePawn),
];

impl PlayerPiece {
    pub fn new(player: Player, piece: Piece) -> Self {
        use PlayerPiece::*;
        match (player, piece) {
            (Player::White, Piece::King) => WhiteKing,
            (Player::White, Piece::Queen) => WhiteQueen,
            (Player::White, Piece::Rook) => WhiteRook,
            (Player::White, Piece::Bishop) => WhiteBishop,
            (Player::White, Piece::Knight) => WhiteKnight,
            (Player::White, Piece::Pawn) => WhitePawn,
            (Player::Black, Piece::King) => BlackKing,
            (Player::Black, Piece::Queen) => BlackQueen,
            (Player::Black, Piece::Rook) => BlackRook,
            (Player::Black, Piece::Bishop) => BlackBishop,
            (Player::Black, Piece::Knight) => BlackKnight,
            (Player::Black, Piece::Pawn) => BlackPawn,
        }
    }

    pub fn player(self) -> Player {
        use PlayerPiece::*;
        match self {
            WhiteKing | WhiteQueen | WhiteRook | WhiteBishop | WhiteKnight | WhitePawn => {
                Player::White
            }
            _ => Player::Black,
        }
    }

    pub fn piece(self) -> Piece {
        use PlayerPiece::*;
        match self {
            WhiteKing | BlackKing => Piece::King,
            WhiteQueen | BlackQueen => Piece::Queen,
            WhiteRook | BlackRook => Piece::Rook,
            WhiteBishop | BlackBishop => Piece::Bishop,
            WhiteKnight | BlackKnight => Piece::Knight,
            WhitePawn | BlackPawn => Piece::Pawn,
        }
    }

    /// Look up a FEN piece letter (`pnbrqk` black, `PNBRQK` white)
    pub fn from_fen_char(c: char) -> Option<Self> {
        FEN_PIECES
            .iter()
            .find(|(letter, _)| *letter == c)
            .map(|(_, piece)| *piece)
    }

    /// The FEN letter for this piece
    pub fn fen_char(self) -> char {
        FEN_PIECES
            .iter()
            .find(|(_, piece)| *piece == self)
            .map(|(letter, _)| *letter)
            .unwrap_or('?')
    }
}

impl fmt::Display for PlayerPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let piece = self.piece().to_string();
        let mut chars = piece.chars();
        let capitalized: String = chars
            .next()
            .map(|first| first.to_ascii_uppercase())
            .into_iter()
            .chain(chars)
            .collect();
        write!(f, "{}{}", self.player(), capitalized)
    }
}

/// Which rook a castling right refers to
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CastlingSide {
    Kingside,
    Queenside,
}

impl CastlingSide {
    pub const ALL: [CastlingSide; 2] = [CastlingSide::Kingside, CastlingSide::Queenside];

    /// The letter that encodes this right in a FEN castling field
    pub fn fen_char(self, player: Player) -> char {
        match (player, self) {
            (Player::White, CastlingSide::Kingside) => 'K',
            (Player::White, CastlingSide::Queenside) => 'Q',
            (Player::Black, CastlingSide::Kingside) => 'k',
            (Player::Black, CastlingSide::Queenside) => 'q',
        }
    }
}

/// True chessboard colouring of a square
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
pub enum SquareColor {
    #[serde(rename = "lightSquare")]
    Light,
    #[serde(rename = "darkSquare")]
    Dark,
}

/// Annotation palette shared by highlights and arrows
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

/// A coloured square marker
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Highlight {
    pub color: Color,
    pub square: Square,
}

/// A coloured arrow between two squares
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Arrow {
    pub color: Color,
    pub from: Square,
    pub to: Square,
}
