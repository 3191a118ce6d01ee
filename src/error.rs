//! Error types for the chessboard engine.
//!
//! Malformed input and precondition violations surface here. An illegal
//! move is not an error: `Chessboard::make_move` reports it as `false`.

/// Errors that can occur while parsing notation or editing a chessboard
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    /// The square name has an unknown file or rank character
    #[error("The square '{square}' is not valid")]
    InvalidSquare { square: String },

    /// Board indices outside `[0, BOARD_SIZE)`
    #[error("The board indices [{file}, {rank}] are out of bounds")]
    IndexOutOfBounds { file: usize, rank: usize },

    /// The FEN (or its placement field) does not parse
    #[error("The FEN '{fen}' is not valid")]
    InvalidFen { fen: String },

    /// A FEN field required by the operation is absent
    #[error("The FEN '{fen}' has no {field} field")]
    MissingField { fen: String, field: &'static str },

    /// The PGN could not be tokenized or one of its moves was rejected
    #[error("The PGN is invalid: {message}")]
    InvalidPgn { message: String },

    /// `undo` was called before any move was made
    #[error("Can't undo because no moves have been made")]
    NoMovesToUndo,

    /// A starting-position edit referenced an empty square
    #[error("There is no piece on the square '{square}'")]
    NoPieceOnSquare { square: String },

    /// An author content block is neither a FEN diagram nor a PGN game
    #[error("The content of this block could not be parsed: {reason}")]
    UnparseableContent { reason: String },
}

impl ChessError {
    pub(crate) fn invalid_fen(fen: &str) -> Self {
        ChessError::InvalidFen {
            fen: fen.to_string(),
        }
    }

    pub(crate) fn invalid_pgn(message: impl Into<String>) -> Self {
        ChessError::InvalidPgn {
            message: message.into(),
        }
    }
}

/// Result type alias for chessboard operations
pub type ChessResult<T> = Result<T, ChessError>;
