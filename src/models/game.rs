//! Game state model - a starting position, the moves played from it and the
//! annotations attached to every resulting position.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Annotations, Arrow, CastlingSide, Highlight, Piece, Player, PlayerPiece, STARTING_POSITION,
    Square, fen_can_castle, parse_comment, parse_pgn, set_fen_can_castle, set_fen_starting_player,
    starting_player,
};
use crate::error::{ChessError, ChessResult};
use crate::models::rules::{AppliedMove, DefaultRules, PieceOnSquare, RulesEngine};

/// The engine-derived part of a position. Never changes once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub fen: String,
    pub check: bool,
    pub checkmate: bool,
}

/// One ply. `positions[i + 1]` is the result of `moves[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Move {
    pub player: Player,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub capture: bool,
    /// SAN, e.g. `Qxe5+`
    pub algebraic: String,
}

impl From<&AppliedMove> for Move {
    fn from(applied: &AppliedMove) -> Self {
        Move {
            player: applied.player,
            from: applied.from,
            to: applied.to,
            piece: applied.piece,
            capture: applied.capture,
            algebraic: applied.san.clone(),
        }
    }
}

/// A position together with its annotations, as handed to renderers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotatedPosition {
    #[serde(flatten)]
    pub position: Position,
    #[serde(flatten)]
    pub annotations: Annotations,
}

/// Serializable snapshot of a whole game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub starting_position: String,
    pub positions: Vec<AnnotatedPosition>,
    pub moves: Vec<Move>,
}

/// The chessboard game state.
///
/// `positions`, `annotations` and `moves` always satisfy
/// `positions.len() == annotations.len() == moves.len() + 1`.
#[derive(Clone, Debug)]
pub struct Chessboard<R: RulesEngine = DefaultRules> {
    starting_position: String,
    starting_player: Player,
    rules: R,
    positions: Vec<Position>,
    annotations: Vec<Annotations>,
    moves: Vec<Move>,
}

impl Chessboard {
    /// A board set up for a normal game
    pub fn new() -> Self {
        Self::with_starting_position(None).expect("standard starting position is valid")
    }
}

impl Default for Chessboard {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RulesEngine> Chessboard<R> {
    /// Start from `fen`, or the standard setup when `None`
    pub fn with_starting_position(fen: Option<&str>) -> ChessResult<Self> {
        let rules = R::load(fen.unwrap_or(STARTING_POSITION))?;
        let starting_position = rules.fen();
        let starting_player = starting_player(&starting_position)?;

        let position = Position {
            fen: starting_position.clone(),
            check: rules.in_check(),
            checkmate: rules.is_checkmate(),
        };

        Ok(Self {
            starting_position,
            starting_player,
            rules,
            positions: vec![position],
            annotations: vec![Annotations::default()],
            moves: Vec::new(),
        })
    }

    /// Parse a PGN and replay its main line.
    ///
    /// A `[FEN "..."]` tag sets up a custom start. Comments are parsed for
    /// annotations; one before the first move annotates the start.
    pub fn load(pgn: &str) -> ChessResult<Self> {
        let game = parse_pgn(pgn)?;
        let mut board = Self::with_starting_position(game.starting_fen())
            .map_err(|err| ChessError::invalid_pgn(format!("bad FEN header ({err})")))?;

        if let Some(comment) = &game.comment {
            board.annotate(parse_comment(comment));
        }

        for (ply, pgn_move) in game.moves.iter().enumerate() {
            if !board.make_move(&pgn_move.san) {
                return Err(ChessError::invalid_pgn(format!(
                    "move {} '{}' is not legal",
                    ply / 2 + 1,
                    pgn_move.san
                )));
            }
            if let Some(comment) = &pgn_move.comment {
                board.annotate(parse_comment(comment));
            }
        }

        debug!(moves = board.moves.len(), "loaded PGN");
        Ok(board)
    }

    /// Replace the starting position. All moves are discarded.
    pub fn set_starting_position(&mut self, fen: &str) -> ChessResult<()> {
        *self = Self::with_starting_position(Some(fen))?;
        debug!(fen = %self.starting_position, "starting position replaced");
        Ok(())
    }

    /// Go back to the starting position, dropping every move
    pub fn reset(&mut self) {
        while self.rules.undo() {}
        self.positions.truncate(1);
        self.annotations.truncate(1);
        self.annotations[0] = Annotations::default();
        self.moves.clear();
    }

    /// Try a move in SAN or a looser notation such as `e2e4`.
    ///
    /// Returns false, leaving the board untouched, if the move is not legal.
    pub fn make_move(&mut self, notation: &str) -> bool {
        let Some(applied) = self.rules.play(notation) else {
            return false;
        };

        self.moves.push(Move::from(&applied));
        self.positions.push(Position {
            fen: applied.fen,
            check: applied.check,
            checkmate: applied.checkmate,
        });
        self.annotations.push(Annotations::default());
        true
    }

    /// Take back the last move, discarding its annotations
    pub fn undo(&mut self) -> ChessResult<Move> {
        let last = self.moves.pop().ok_or(ChessError::NoMovesToUndo)?;
        self.positions.pop();
        self.annotations.pop();
        self.rules.undo();
        Ok(last)
    }

    fn current_position(&self) -> &Position {
        &self.positions[self.moves.len()]
    }

    fn current_annotations_mut(&mut self) -> &mut Annotations {
        let index = self.moves.len();
        &mut self.annotations[index]
    }

    fn annotate(&mut self, parsed: Annotations) {
        let current = self.current_annotations_mut();
        if parsed.comment.is_some() {
            current.comment = parsed.comment;
        }
        current.highlights.extend(parsed.highlights);
        current.arrows.extend(parsed.arrows);
    }

    /// FEN of the current position
    pub fn fen(&self) -> &str {
        &self.current_position().fen
    }

    pub fn starting_position(&self) -> &str {
        &self.starting_position
    }

    pub fn starting_player(&self) -> Player {
        self.starting_player
    }

    pub fn is_starting_player_white(&self) -> bool {
        self.starting_player == Player::White
    }

    pub fn is_starting_player_black(&self) -> bool {
        self.starting_player == Player::Black
    }

    /// Whose turn it is, by parity of the moves played
    pub fn current_player(&self) -> Player {
        if self.moves.len() % 2 == 0 {
            self.starting_player
        } else {
            self.starting_player.opponent()
        }
    }

    /// Whether the last move captured something
    pub fn is_capture(&self) -> bool {
        self.moves.last().is_some_and(|m| m.capture)
    }

    pub fn is_check(&self) -> bool {
        self.current_position().check
    }

    pub fn is_checkmate(&self) -> bool {
        self.current_position().checkmate
    }

    pub fn pieces(&self) -> Vec<PieceOnSquare> {
        self.rules.pieces()
    }

    /// Destinations reachable from `square` in the current position
    pub fn legal_moves(&self, square: Square) -> Vec<Square> {
        self.rules.legal_moves(square)
    }

    pub fn has_piece(&self, player: Player, piece: Piece) -> bool {
        self.rules
            .pieces()
            .iter()
            .any(|p| p.player == player && p.piece == piece)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.moves.last()
    }

    /// SAN of every move played, in order
    pub fn history(&self) -> Vec<&str> {
        self.moves.iter().map(|m| m.algebraic.as_str()).collect()
    }

    /// Annotations of `positions[index]`
    pub fn annotations_at(&self, index: usize) -> Option<&Annotations> {
        self.annotations.get(index)
    }

    fn setup(&self) -> ChessResult<R> {
        R::load(&self.starting_position)
    }

    /// Put a piece on the starting position, replacing any piece there
    pub fn add_piece_to_starting_position(
        &mut self,
        square: Square,
        piece: PlayerPiece,
    ) -> ChessResult<()> {
        let mut setup = self.setup()?;
        setup.put(square, piece)?;
        self.set_starting_position(&setup.fen())
    }

    /// Clear a square of the starting position, returning the removed piece.
    ///
    /// Like every edit of the setup this discards the moves played, even
    /// when the square was already empty.
    pub fn remove_piece_from_starting_position(
        &mut self,
        square: Square,
    ) -> ChessResult<Option<PlayerPiece>> {
        let mut setup = self.setup()?;
        let removed = setup.remove(square)?;
        self.set_starting_position(&setup.fen())?;
        Ok(removed)
    }

    /// Move a piece within the starting position, ignoring legality
    pub fn move_piece_in_starting_position(&mut self, from: Square, to: Square) -> ChessResult<()> {
        let mut setup = self.setup()?;
        let piece = setup.remove(from)?.ok_or_else(|| ChessError::NoPieceOnSquare {
            square: from.to_string(),
        })?;
        setup.put(to, piece)?;
        self.set_starting_position(&setup.fen())
    }

    pub fn set_starting_player(&mut self, player: Player) -> ChessResult<()> {
        let fen = set_fen_starting_player(&self.starting_position, player)?;
        self.set_starting_position(&fen)
    }

    /// Castling right recorded in the starting position
    pub fn can_castle(&self, player: Player, side: CastlingSide) -> ChessResult<bool> {
        fen_can_castle(&self.starting_position, player, side)
    }

    pub fn set_can_castle(
        &mut self,
        player: Player,
        side: CastlingSide,
        allowed: bool,
    ) -> ChessResult<()> {
        let fen = set_fen_can_castle(&self.starting_position, player, side, allowed)?;
        self.set_starting_position(&fen)
    }

    /// Comment on the current position
    pub fn comment(&self) -> Option<&str> {
        self.annotations[self.moves.len()].comment.as_deref()
    }

    /// Replace the comment on the current position; `None` clears it
    pub fn set_comment(&mut self, comment: Option<String>) {
        self.current_annotations_mut().comment = comment;
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.annotations[self.moves.len()].highlights
    }

    /// Highlights are not deduplicated
    pub fn add_highlight(&mut self, highlight: Highlight) {
        self.current_annotations_mut().highlights.push(highlight);
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.annotations[self.moves.len()].arrows
    }

    pub fn add_arrow(&mut self, arrow: Arrow) {
        self.current_annotations_mut().arrows.push(arrow);
    }

    pub fn view(&self) -> GameView {
        GameView {
            starting_position: self.starting_position.clone(),
            positions: self
                .positions
                .iter()
                .zip(&self.annotations)
                .map(|(position, annotations)| AnnotatedPosition {
                    position: position.clone(),
                    annotations: annotations.clone(),
                })
                .collect(),
            moves: self.moves.clone(),
        }
    }
}
