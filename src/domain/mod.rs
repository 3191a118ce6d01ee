//! Chess vocabulary and text codecs. Nothing here holds game state.

pub mod annotations;
pub mod chess;
pub mod fen;
pub mod pgn;
pub mod squares;

pub use annotations::{Annotations, Shorthand, parse_comment, parse_shorthand};
pub use chess::{Arrow, CastlingSide, Color, Highlight, Piece, Player, PlayerPiece, SquareColor};
pub use fen::{
    EMPTY_POSITION, ParsedPosition, STARTING_POSITION, fen_can_castle, fen_positions_equal,
    is_fen_line, is_fen_valid, normalize_fen, parse_position, parsed_position_size,
    resize_parsed_position, sanitize_fen, serialize_position, set_fen_can_castle,
    set_fen_starting_player, starting_player,
};
pub use pgn::{PgnGame, PgnMove, parse_pgn};
pub use squares::{
    BOARD_SIZE, Indices, Square, indices_to_square, is_knight_move, orient_indices,
    reverse_y_index, square_color, square_to_indices,
};
