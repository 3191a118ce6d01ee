//! Author content blocks.
//!
//! A block is either a diagram (a FEN line followed by shorthand
//! directives) or a PGN game. Anything else is an authoring mistake and is
//! reported, never rendered as an empty board.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Arrow, Highlight, ParsedPosition, is_fen_line, parse_position, parse_shorthand,
    parsed_position_size, resize_parsed_position,
};
use crate::error::{ChessError, ChessResult};
use crate::models::game::{Chessboard, GameView};

/// A static board with drawings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagram {
    /// The FEN line as written
    pub fen: String,
    pub files: usize,
    pub ranks: usize,
    /// Rank-major grid, top rank first
    pub grid: ParsedPosition,
    pub highlights: Vec<Highlight>,
    pub arrows: Vec<Arrow>,
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Content {
    Diagram(Diagram),
    Game(GameView),
}

fn parse_diagram(first_line: &str, rest: &str) -> ChessResult<Diagram> {
    let mut grid = parse_position(first_line)?;
    let shorthand = parse_shorthand(rest);

    if let Some((files, ranks)) = shorthand.board_size {
        grid = resize_parsed_position(&grid, files, ranks);
    }
    let (ranks, files) = parsed_position_size(&grid);

    Ok(Diagram {
        fen: first_line.to_string(),
        files,
        ranks,
        grid,
        highlights: shorthand.highlights,
        arrows: shorthand.arrows,
        caption: shorthand.caption,
    })
}

/// Decide what a block is and parse it
pub fn parse_content(text: &str) -> ChessResult<Content> {
    let text = text.trim();
    let Some((first_line, rest)) = text
        .split_once('\n')
        .or_else(|| (!text.is_empty()).then_some((text, "")))
    else {
        return Err(ChessError::UnparseableContent {
            reason: "the block is empty".to_string(),
        });
    };

    let first_line = first_line.trim();
    if is_fen_line(first_line) {
        let diagram = parse_diagram(first_line, rest)?;
        debug!(fen = first_line, "diagram block");
        return Ok(Content::Diagram(diagram));
    }

    let board: Chessboard = Chessboard::load(text).map_err(|err| ChessError::UnparseableContent {
        reason: format!("neither a FEN diagram nor a PGN game ({err})"),
    })?;
    debug!(moves = board.moves().len(), "game block");
    Ok(Content::Game(board.view()))
}
