//! Chess game state for rendering boards.
//!
//! FEN and PGN go in; positions, moves and their annotations come out. Move
//! legality is delegated to `shakmaty` through [`models::RulesEngine`].

pub mod domain;
pub mod error;
pub mod models;

pub use domain::{
    Arrow, CastlingSide, Color, Highlight, Piece, Player, PlayerPiece, STARTING_POSITION, Square,
};
pub use error::{ChessError, ChessResult};
pub use models::{Chessboard, Content, Move, Position, parse_content};
