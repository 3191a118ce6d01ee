//! Rules engine adapter.
//!
//! Move legality, check and checkmate come from `shakmaty`. This module
//! translates between its vocabulary (`Role`, `Color`, its `Square`) and
//! ours, and adds what a position editor needs on top: loading any
//! structurally valid FEN (including boards without kings), placing and
//! removing pieces, undo and lenient move parsing.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{
    Board, CastlingMode, Chess, Color as SColor, EnPassantMode, File, Move as EngineMove,
    Piece as EnginePiece, Position, PositionError, Rank, Role, Square as EngineSquare,
};
use tracing::{debug, trace};

use crate::domain::fen::{is_fen_valid, normalize_fen};
use crate::domain::{Piece, Player, PlayerPiece, Square};
use crate::error::{ChessError, ChessResult};

/// The engine used when none is chosen explicitly
pub type DefaultRules = ShakmatyRules;

/// Everything the game state engine records about one applied ply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedMove {
    pub player: Player,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub capture: bool,
    /// SAN including the `+`/`#` suffix
    pub san: String,
    /// FEN of the resulting position
    pub fen: String,
    pub check: bool,
    pub checkmate: bool,
}

/// A piece found while scanning the board
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
pub struct PieceOnSquare {
    pub piece: Piece,
    pub player: Player,
    pub square: Square,
}

/// The capability the chessboard needs from a chess rules implementation.
///
/// One instance tracks one line of play from the FEN it was loaded with.
pub trait RulesEngine: Sized {
    /// Load a complete FEN; the instance starts with no moves played
    fn load(fen: &str) -> ChessResult<Self>;

    /// Structural FEN check; never fails
    fn validate_fen(fen: &str) -> bool;

    /// Re-emit a valid FEN in the engine's canonical formatting
    fn normalize_fen(fen: &str) -> Option<String>;

    /// FEN of the current position
    fn fen(&self) -> String;

    /// Apply a move given in SAN or a looser notation.
    ///
    /// Returns `None` when the notation does not describe a legal move.
    fn play(&mut self, notation: &str) -> Option<AppliedMove>;

    /// Take back the last applied move, returning false if there was none
    fn undo(&mut self) -> bool;

    fn in_check(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    /// Every occupied square of the current position, top rank first
    fn pieces(&self) -> Vec<PieceOnSquare>;

    /// Destination squares of the legal moves starting on `square`
    fn legal_moves(&self, square: Square) -> Vec<Square>;

    /// Place a piece, replacing whatever stood there. Move history is dropped.
    fn put(&mut self, square: Square, piece: PlayerPiece) -> ChessResult<()>;

    /// Clear a square, returning the piece that was on it
    fn remove(&mut self, square: Square) -> ChessResult<Option<PlayerPiece>>;
}

static COORDINATE_MOVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-h][1-8])[-x:]?([a-h][1-8])=?([qrbnQRBN])?$").expect("coordinate regex")
});
static BARE_PROMOTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*[18])([QRBN])$").expect("promotion regex"));

fn piece_from_role(role: Role) -> Piece {
    match role {
        Role::Pawn => Piece::Pawn,
        Role::Knight => Piece::Knight,
        Role::Bishop => Piece::Bishop,
        Role::Rook => Piece::Rook,
        Role::Queen => Piece::Queen,
        Role::King => Piece::King,
    }
}

fn role_from_piece(piece: Piece) -> Role {
    match piece {
        Piece::Pawn => Role::Pawn,
        Piece::Knight => Role::Knight,
        Piece::Bishop => Role::Bishop,
        Piece::Rook => Role::Rook,
        Piece::Queen => Role::Queen,
        Piece::King => Role::King,
    }
}

fn player_from_color(color: SColor) -> Player {
    match color {
        SColor::White => Player::White,
        SColor::Black => Player::Black,
    }
}

fn color_from_player(player: Player) -> SColor {
    match player {
        Player::White => SColor::White,
        Player::Black => SColor::Black,
    }
}

fn to_engine_square(square: Square) -> EngineSquare {
    let (file, rank) = square.indices();
    EngineSquare::from_coords(File::new(file as u32), Rank::new(rank as u32))
}

fn from_engine_square(square: EngineSquare) -> Square {
    let file = square.file().char() as u8 - b'a';
    let rank = square.rank().char() as u8 - b'1';
    Square::from_parts(file, rank)
}

fn to_engine_piece(piece: PlayerPiece) -> EnginePiece {
    EnginePiece {
        color: color_from_player(piece.player()),
        role: role_from_piece(piece.piece()),
    }
}

fn from_engine_piece(piece: EnginePiece) -> PlayerPiece {
    PlayerPiece::new(player_from_color(piece.color), piece_from_role(piece.role))
}

/// Origin and destination as a player sees them.
///
/// For castling the destination is the king's target square, not the rook.
fn move_squares(m: &EngineMove) -> Option<(EngineSquare, EngineSquare)> {
    match m {
        EngineMove::Normal { from, to, .. } => Some((*from, *to)),
        EngineMove::EnPassant { from, to, .. } => Some((*from, *to)),
        EngineMove::Castle { king, rook, .. } => {
            let king_dest = if rook.file() == File::H {
                EngineSquare::from_coords(File::G, rook.rank())
            } else {
                EngineSquare::from_coords(File::C, rook.rank())
            };
            Some((*king, king_dest))
        }
        EngineMove::Put { .. } => None,
    }
}

/// Build a playable position, tolerating castling rights and en passant
/// squares that do not match the board. Returns `None` for setups the
/// engine cannot play at all, such as a board without kings.
fn playable_position(fen: &str) -> Option<Chess> {
    let setup = fen.parse::<Fen>().ok().or_else(|| {
        // Castling rights without a matching rook can trip the parser
        let mut fields: Vec<&str> = fen.split_whitespace().collect();
        fields[2] = "-";
        fields.join(" ").parse::<Fen>().ok()
    })?;

    setup
        .into_position::<Chess>(CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .or_else(PositionError::ignore_invalid_ep_square)
        .ok()
}

/// Lenient move lookup: strict SAN first, then coordinate notation, then
/// SAN with capture marks ignored.
fn resolve_move(position: &Chess, notation: &str) -> Option<EngineMove> {
    let cleaned = notation.trim().trim_end_matches(['+', '#', '!', '?']);
    if cleaned.is_empty() {
        return None;
    }

    // SAN never contains a zero, so this only rewrites 0-0 and 0-0-0
    let san_text = cleaned.replace('0', "O");
    if let Ok(san) = san_text.parse::<San>() {
        if let Ok(m) = san.to_move(position) {
            return Some(m);
        }
    }

    let legal = position.legal_moves();

    if let Some(caps) = COORDINATE_MOVE_REGEX.captures(cleaned) {
        let from = caps[1].parse::<Square>().ok().map(to_engine_square)?;
        let to = caps[2].parse::<Square>().ok().map(to_engine_square)?;
        let promotion = caps
            .get(3)
            .and_then(|p| Role::from_char(p.as_str().chars().next()?.to_ascii_uppercase()));

        return legal
            .iter()
            .find(|m| move_squares(m) == Some((from, to)) && m.promotion() == promotion)
            .copied();
    }

    let mut bare = cleaned.replace(['x', ':'], "");
    if let Some(caps) = BARE_PROMOTION_REGEX.captures(&bare) {
        bare = format!("{}={}", &caps[1], &caps[2]);
    }

    let Ok(San::Normal {
        role,
        file,
        rank,
        to,
        promotion,
        ..
    }) = bare.parse::<San>()
    else {
        return None;
    };

    let mut candidates = legal.iter().filter(|m| {
        m.castling_side().is_none()
            && m.role() == role
            && m.to() == to
            && m.promotion() == promotion
            && m.from().is_some_and(|from| {
                file.is_none_or(|f| f == from.file()) && rank.is_none_or(|r| r == from.rank())
            })
    });

    match (candidates.next(), candidates.next()) {
        (Some(m), None) => Some(*m),
        _ => None,
    }
}

/// `RulesEngine` backed by `shakmaty::Chess`
#[derive(Clone, Debug)]
pub struct ShakmatyRules {
    /// FEN this instance was loaded from, reported until a move is played
    start_fen: String,
    start_board: Board,
    /// `None` when the setup has pieces but cannot be played
    start: Option<Chess>,
    /// Position after each applied move
    history: Vec<Chess>,
}

impl ShakmatyRules {
    fn current(&self) -> Option<&Chess> {
        self.history.last().or(self.start.as_ref())
    }

    fn board(&self) -> &Board {
        self.current()
            .map(|position| position.board())
            .unwrap_or(&self.start_board)
    }

    /// Reload from the current FEN with a different placement
    fn reload_with_board(&mut self, board: &Board) -> ChessResult<()> {
        let fen = self.fen();
        let placement = board.to_string();
        let mut fields: Vec<&str> = fen.split_whitespace().collect();
        fields[0] = &placement;
        *self = Self::load(&fields.join(" "))?;
        Ok(())
    }
}

impl RulesEngine for ShakmatyRules {
    fn load(fen: &str) -> ChessResult<Self> {
        if !Self::validate_fen(fen) {
            return Err(ChessError::invalid_fen(fen));
        }

        let fen = fen.split_whitespace().collect::<Vec<_>>().join(" ");
        let placement = fen.split_whitespace().next().unwrap_or_default();
        let start_board = placement
            .parse::<Board>()
            .map_err(|_| ChessError::invalid_fen(&fen))?;

        let start = playable_position(&fen);
        if start.is_none() {
            debug!(fen = %fen, "setup cannot be played; moves will be rejected");
        }

        Ok(Self {
            start_fen: fen,
            start_board,
            start,
            history: Vec::new(),
        })
    }

    fn validate_fen(fen: &str) -> bool {
        is_fen_valid(fen)
    }

    fn normalize_fen(fen: &str) -> Option<String> {
        normalize_fen(fen)
    }

    fn fen(&self) -> String {
        match self.history.last() {
            Some(position) => Fen::from_position(position, EnPassantMode::Always).to_string(),
            None => self.start_fen.clone(),
        }
    }

    fn play(&mut self, notation: &str) -> Option<AppliedMove> {
        let Some(position) = self.current().cloned() else {
            debug!(notation, "no playable position");
            return None;
        };

        let Some(m) = resolve_move(&position, notation) else {
            debug!(notation, "rejected move");
            return None;
        };
        let (from, to) = move_squares(&m)?;

        let player = player_from_color(position.turn());
        let san = San::from_move(&position, m);
        let next = position.play(m).ok()?;

        let check = next.is_check();
        let checkmate = next.is_checkmate();
        let suffix = if checkmate {
            "#"
        } else if check {
            "+"
        } else {
            ""
        };

        let applied = AppliedMove {
            player,
            from: from_engine_square(from),
            to: from_engine_square(to),
            piece: piece_from_role(m.role()),
            capture: m.is_capture(),
            san: format!("{san}{suffix}"),
            fen: Fen::from_position(&next, EnPassantMode::Always).to_string(),
            check,
            checkmate,
        };

        trace!(san = %applied.san, fen = %applied.fen, "applied move");
        self.history.push(next);
        Some(applied)
    }

    fn undo(&mut self) -> bool {
        self.history.pop().is_some()
    }

    fn in_check(&self) -> bool {
        self.current().is_some_and(|position| position.is_check())
    }

    fn is_checkmate(&self) -> bool {
        self.current().is_some_and(|position| position.is_checkmate())
    }

    fn pieces(&self) -> Vec<PieceOnSquare> {
        let board = self.board();
        let mut pieces = Vec::new();

        for rank in (0..8u32).rev() {
            for file in 0..8u32 {
                let square = EngineSquare::from_coords(File::new(file), Rank::new(rank));
                if let Some(piece) = board.piece_at(square) {
                    let piece = from_engine_piece(piece);
                    pieces.push(PieceOnSquare {
                        piece: piece.piece(),
                        player: piece.player(),
                        square: from_engine_square(square),
                    });
                }
            }
        }

        pieces
    }

    fn legal_moves(&self, square: Square) -> Vec<Square> {
        let Some(position) = self.current() else {
            return Vec::new();
        };
        let from = to_engine_square(square);

        let mut destinations = Vec::new();
        for m in &position.legal_moves() {
            if let Some((move_from, move_to)) = move_squares(m) {
                let to = from_engine_square(move_to);
                // Promotions yield one move per piece
                if move_from == from && !destinations.contains(&to) {
                    destinations.push(to);
                }
            }
        }
        destinations
    }

    fn put(&mut self, square: Square, piece: PlayerPiece) -> ChessResult<()> {
        let mut board = self.board().clone();
        board.set_piece_at(to_engine_square(square), to_engine_piece(piece));
        self.reload_with_board(&board)
    }

    fn remove(&mut self, square: Square) -> ChessResult<Option<PlayerPiece>> {
        let mut board = self.board().clone();
        let Some(removed) = board.remove_piece_at(to_engine_square(square)) else {
            return Ok(None);
        };
        self.reload_with_board(&board)?;
        Ok(Some(from_engine_piece(removed)))
    }
}
