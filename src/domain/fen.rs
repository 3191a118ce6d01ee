//! Forsyth-Edwards Notation helpers.
//!
//! Besides the standard six-field format, the placement field may describe
//! a board smaller than 8x8 (puzzle diagrams). Parsing infers the board
//! dimensions from the content and pads short ranks on the right.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::Board;
use tracing::trace;

use super::chess::{CastlingSide, Player, PlayerPiece};
use super::squares::BOARD_SIZE;
use crate::error::{ChessError, ChessResult};

/// The standard game-opening position
pub const STARTING_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// An empty board; its trailing fields are the defaults used by `sanitize_fen`
pub const EMPTY_POSITION: &str = "8/8/8/8/8/8/8/8 w KQkq - 0 1";

/// Rank-major grid of board cells, first row is the top (highest) rank
pub type ParsedPosition = Vec<Vec<Option<PlayerPiece>>>;

static PLACEMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[pnbrqkPNBRQK1-8]+(/[pnbrqkPNBRQK1-8]+)*$").expect("placement regex")
});

static CASTLING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-|K?Q?k?q?)$").expect("castling regex"));
static EN_PASSANT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-|[a-h][36])$").expect("en passant regex"));

/// Check one of the five trailing FEN fields (index 1 is side to move)
fn is_fen_field_valid(index: usize, value: &str) -> bool {
    match index {
        1 => value == "w" || value == "b",
        2 => !value.is_empty() && CASTLING_REGEX.is_match(value),
        3 => EN_PASSANT_REGEX.is_match(value),
        4 => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
        5 => value.parse::<u32>().is_ok_and(|n| n > 0),
        _ => false,
    }
}

/// Eight ranks of exactly eight squares, no adjacent digits, and a board
/// `shakmaty` accepts
fn is_placement_valid(placement: &str) -> bool {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != BOARD_SIZE {
        return false;
    }

    for rank in ranks {
        let mut squares = 0;
        let mut previous_digit = false;
        for c in rank.chars() {
            match c.to_digit(10) {
                Some(n @ 1..=8) if !previous_digit => {
                    squares += n;
                    previous_digit = true;
                }
                Some(_) => return false,
                None if PlayerPiece::from_fen_char(c).is_some() => {
                    squares += 1;
                    previous_digit = false;
                }
                None => return false,
            }
        }
        if squares != BOARD_SIZE as u32 {
            return false;
        }
    }

    placement.parse::<Board>().is_ok()
}

/// Split a FEN into its whitespace-separated fields
fn split_fen(fen: &str) -> Vec<&str> {
    fen.split_whitespace().collect()
}

/// The placement component of a FEN
fn fen_placement(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap_or("")
}

fn parse_rank(rank: &str) -> Vec<Option<PlayerPiece>> {
    let mut cells = Vec::new();
    for c in rank.chars() {
        match c.to_digit(10) {
            Some(empty) => cells.extend(std::iter::repeat_n(None, empty as usize)),
            None => cells.push(PlayerPiece::from_fen_char(c)),
        }
    }
    cells
}

/// Lenient rank parser for the sanitizer: unknown characters are dropped
fn parse_rank_lossy(rank: &str) -> Vec<Option<PlayerPiece>> {
    let mut cells = Vec::new();
    for c in rank.chars() {
        match c {
            '1'..='8' => {
                let empty = c.to_digit(10).unwrap_or(0) as usize;
                cells.extend(std::iter::repeat_n(None, empty));
            }
            _ => {
                if let Some(piece) = PlayerPiece::from_fen_char(c) {
                    cells.push(Some(piece));
                }
            }
        }
    }
    cells
}

fn serialize_rank(cells: &[Option<PlayerPiece>]) -> String {
    let mut out = String::new();
    let mut empty = 0;

    let flush = |out: &mut String, empty: &mut usize| {
        // A single digit never exceeds a full rank
        while *empty > 0 {
            let run = (*empty).min(BOARD_SIZE);
            out.push_str(&run.to_string());
            *empty -= run;
        }
    };

    for cell in cells {
        match cell {
            Some(piece) => {
                flush(&mut out, &mut empty);
                out.push(piece.fen_char());
            }
            None => empty += 1,
        }
    }
    flush(&mut out, &mut empty);
    out
}

/// Number of ranks and number of files (in that order)
pub fn parsed_position_size(parsed: &ParsedPosition) -> (usize, usize) {
    let ranks = parsed.len();
    let files = parsed.iter().map(Vec::len).max().unwrap_or(0);
    (ranks, files)
}

/// Parse the placement field of a FEN into a rectangular grid.
///
/// Only the first field is read, so a bare placement string is accepted.
pub fn parse_position(fen: &str) -> ChessResult<ParsedPosition> {
    let placement = fen_placement(fen);

    if !PLACEMENT_REGEX.is_match(placement) {
        return Err(ChessError::invalid_fen(fen));
    }

    let mut parsed: ParsedPosition = placement.split('/').map(parse_rank).collect();
    let (_, files) = parsed_position_size(&parsed);

    for rank in &mut parsed {
        rank.resize(files, None);
    }

    Ok(parsed)
}

/// Write a grid back out as a FEN placement field
pub fn serialize_position(parsed: &ParsedPosition) -> String {
    parsed
        .iter()
        .map(|rank| serialize_rank(rank))
        .collect::<Vec<_>>()
        .join("/")
}

/// Truncate or pad a grid to `files` x `ranks`.
///
/// The a1 corner stays fixed: files are cut or padded on the right and
/// ranks on the top, so a diagram keeps its lower-left squares.
pub fn resize_parsed_position(parsed: &ParsedPosition, files: usize, ranks: usize) -> ParsedPosition {
    let skip = parsed.len().saturating_sub(ranks);
    let missing = ranks.saturating_sub(parsed.len());

    let empty_rank = vec![None; files];
    let mut resized: ParsedPosition = std::iter::repeat_n(empty_rank, missing).collect();

    for rank in parsed.iter().skip(skip) {
        let mut rank: Vec<_> = rank.iter().take(files).copied().collect();
        rank.resize(files, None);
        resized.push(rank);
    }

    resized
}

/// Repair a partial or loosely formatted FEN into a complete one.
///
/// Every rank is padded (or cut) to eight squares, the rank count is forced
/// to eight and missing or malformed trailing fields are taken from
/// `EMPTY_POSITION`. Applying it twice gives the same result as once.
pub fn sanitize_fen(fen: &str) -> String {
    let fields = split_fen(fen);
    let defaults = split_fen(EMPTY_POSITION);

    let mut ranks: Vec<&str> = fields
        .first()
        .map(|placement| placement.split('/').collect())
        .unwrap_or_default();
    ranks.resize(BOARD_SIZE, "8");

    let placement = ranks
        .iter()
        .map(|rank| {
            let mut cells = parse_rank_lossy(rank);
            cells.resize(BOARD_SIZE, None);
            serialize_rank(&cells)
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut sanitized = vec![placement];
    for (index, default) in defaults.iter().enumerate().skip(1) {
        let field = fields
            .get(index)
            .filter(|value| is_fen_field_valid(index, value));
        sanitized.push(field.unwrap_or(default).to_string());
    }

    let candidate = sanitized.join(" ");
    let normalized = normalize_fen(&candidate).unwrap_or(candidate);

    if normalized != fen {
        trace!(input = fen, output = %normalized, "sanitized FEN");
    }
    normalized
}

/// True if both FENs have the same piece placement once sanitized.
///
/// Side to move, castling rights and clocks are ignored.
pub fn fen_positions_equal(a: &str, b: &str) -> bool {
    fen_placement(&sanitize_fen(a)) == fen_placement(&sanitize_fen(b))
}

/// Structural check of a complete six-field FEN; never fails.
///
/// Kings and legality are not checked, so an empty board is valid.
pub fn is_fen_valid(fen: &str) -> bool {
    let fields = split_fen(fen);
    fields.len() == 6
        && is_placement_valid(fields[0])
        && fields
            .iter()
            .enumerate()
            .skip(1)
            .all(|(index, value)| is_fen_field_valid(index, value))
}

/// Re-emit a valid FEN with its placement written by `shakmaty` and single
/// spaces between fields
pub fn normalize_fen(fen: &str) -> Option<String> {
    if !is_fen_valid(fen) {
        return None;
    }
    let mut fields: Vec<String> = split_fen(fen).into_iter().map(str::to_string).collect();
    fields[0] = fields[0].parse::<Board>().ok()?.to_string();
    Some(fields.join(" "))
}

/// Whether a whole line reads as a FEN: a placement of two or more ranks,
/// alone or followed by the five remaining fields. Board size is free, so
/// reduced diagrams such as `2p/2kp/1Q/P` qualify.
pub fn is_fen_line(line: &str) -> bool {
    let fields = split_fen(line);
    let Some(placement) = fields.first() else {
        return false;
    };
    if !placement.contains('/') || parse_position(placement).is_err() {
        return false;
    }
    match fields.len() {
        1 => true,
        6 => fields
            .iter()
            .enumerate()
            .skip(1)
            .all(|(index, value)| is_fen_field_valid(index, value)),
        _ => false,
    }
}

fn require_valid(fen: &str) -> ChessResult<Vec<&str>> {
    if !is_fen_valid(fen) {
        return Err(ChessError::invalid_fen(fen));
    }
    Ok(split_fen(fen))
}

/// The side to move recorded in the FEN
pub fn starting_player(fen: &str) -> ChessResult<Player> {
    let side = split_fen(fen).get(1).copied().ok_or_else(|| ChessError::MissingField {
        fen: fen.to_string(),
        field: "side to move",
    })?;

    let mut chars = side.chars();
    match (chars.next().and_then(Player::from_fen_char), chars.next()) {
        (Some(player), None) => Ok(player),
        _ => Err(ChessError::invalid_fen(fen)),
    }
}

/// Rewrite only the side-to-move field
pub fn set_fen_starting_player(fen: &str, player: Player) -> ChessResult<String> {
    let mut fields = require_valid(fen)?;
    let side = player.fen_char().to_string();
    fields[1] = &side;
    Ok(fields.join(" "))
}

/// Whether the castling field grants `player` the right on `side`
pub fn fen_can_castle(fen: &str, player: Player, side: CastlingSide) -> ChessResult<bool> {
    let fields = require_valid(fen)?;
    Ok(fields[2].contains(side.fen_char(player)))
}

/// Grant or revoke one castling right.
///
/// The field is rebuilt from all four rights in `KQkq` order and collapses
/// to `-` when none remain.
pub fn set_fen_can_castle(
    fen: &str,
    player: Player,
    side: CastlingSide,
    allowed: bool,
) -> ChessResult<String> {
    let mut fields = require_valid(fen)?;

    let mut castling = String::new();
    for rights_player in Player::ALL {
        for rights_side in CastlingSide::ALL {
            let letter = rights_side.fen_char(rights_player);
            let granted = if rights_player == player && rights_side == side {
                allowed
            } else {
                fields[2].contains(letter)
            };
            if granted {
                castling.push(letter);
            }
        }
    }

    if castling.is_empty() {
        castling.push('-');
    }

    fields[2] = &castling;
    Ok(fields.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlayerPiece::*;

    const KINGS_PAWN_OPENING: &str =
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
    const CAPTURE_POSITION: &str = "4k3/8/8/8/6R1/8/8/4K3 b - - 0 1";

    fn starting_placement() -> &'static str {
        fen_placement(STARTING_POSITION)
    }

    fn parsed_starting_position() -> ParsedPosition {
        let mut parsed = vec![
            vec![
                BlackRook,
                BlackKnight,
                BlackBishop,
                BlackQueen,
                BlackKing,
                BlackBishop,
                BlackKnight,
                BlackRook,
            ]
            .into_iter()
            .map(Some)
            .collect(),
            vec![Some(BlackPawn); 8],
        ];
        parsed.extend(std::iter::repeat_n(vec![None; 8], 4));
        parsed.push(vec![Some(WhitePawn); 8]);
        parsed.push(
            vec![
                WhiteRook,
                WhiteKnight,
                WhiteBishop,
                WhiteQueen,
                WhiteKing,
                WhiteBishop,
                WhiteKnight,
                WhiteRook,
            ]
            .into_iter()
            .map(Some)
            .collect(),
        );
        parsed
    }

    fn parsed_partial_position() -> ParsedPosition {
        vec![
            vec![None, None, Some(BlackPawn), None],
            vec![None, None, Some(BlackKing), Some(BlackPawn)],
            vec![None, Some(WhiteQueen), None, None],
            vec![Some(WhitePawn), None, None, None],
        ]
    }

    #[test]
    fn test_parse_position_rejects_bad_input() {
        assert!(parse_position("").is_err());
        assert!(parse_position(" \t ").is_err());
        assert!(parse_position("😎").is_err());
        assert!(parse_position("banana").is_err());
        assert!(parse_position("8/8//8").is_err());
        assert!(parse_position("9/8").is_err());
    }

    #[test]
    fn test_parse_position_standard() {
        assert_eq!(parse_position(STARTING_POSITION).unwrap(), parsed_starting_position());
        assert_eq!(parse_position(starting_placement()).unwrap(), parsed_starting_position());
        assert_eq!(parse_position(EMPTY_POSITION).unwrap(), vec![vec![None; 8]; 8]);
    }

    #[test]
    fn test_parse_position_small_board() {
        assert_eq!(parse_position("2p1/2kp/1Q2/P3").unwrap(), parsed_partial_position());
    }

    #[test]
    fn test_parse_position_pads_uneven_ranks() {
        let parsed = parse_position("2p/2kp/1Q/P").unwrap();
        assert_eq!(parsed, parsed_partial_position());
        assert_eq!(parsed_position_size(&parsed), (4, 4));
    }

    #[test]
    fn test_serialize_round_trip_keeps_occupancy() {
        for placement in [
            starting_placement(),
            "8/8/8/8/8/8/8/8",
            "2p1/2kp/1Q2/P3",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R",
            "44/1111p3/8",
        ] {
            let parsed = parse_position(placement).unwrap();
            let serialized = serialize_position(&parsed);
            assert_eq!(parse_position(&serialized).unwrap(), parsed, "{placement}");
        }
        assert_eq!(serialize_position(&parse_position("44/1111p3/8").unwrap()), "8/4p3/8");
    }

    #[test]
    fn test_resize_parsed_position_shrinks() {
        let resized = resize_parsed_position(&parsed_starting_position(), 5, 7);

        let mut expected: ParsedPosition = vec![vec![Some(BlackPawn); 5]];
        expected.extend(std::iter::repeat_n(vec![None; 5], 4));
        expected.push(vec![Some(WhitePawn); 5]);
        expected.push(
            [WhiteRook, WhiteKnight, WhiteBishop, WhiteQueen, WhiteKing]
                .into_iter()
                .map(Some)
                .collect(),
        );

        assert_eq!(resized, expected);
    }

    #[test]
    fn test_resize_parsed_position_grows() {
        let resized = resize_parsed_position(&parsed_partial_position(), 5, 6);
        assert_eq!(parsed_position_size(&resized), (6, 5));
        assert_eq!(resized[0], vec![None; 5]);
        assert_eq!(resized[1], vec![None; 5]);
        assert_eq!(resized[5], vec![Some(WhitePawn), None, None, None, None]);
    }

    #[test]
    fn test_sanitize_fen_keeps_good_fen() {
        assert_eq!(sanitize_fen(STARTING_POSITION), STARTING_POSITION);
        assert_eq!(sanitize_fen(KINGS_PAWN_OPENING), KINGS_PAWN_OPENING);
    }

    #[test]
    fn test_sanitize_fen_pads_ranks() {
        assert_eq!(
            sanitize_fen("2p1/2kp/1Q2/P3/8/8/8/8 w KQkq - 0 1"),
            "2p5/2kp4/1Q6/P7/8/8/8/8 w KQkq - 0 1"
        );
    }

    #[test]
    fn test_sanitize_fen_fixes_rank_count() {
        assert_eq!(
            sanitize_fen("rnbqkbnr/pppppppp/8/8 w KQkq - 0 1"),
            "rnbqkbnr/pppppppp/8/8/8/8/8/8 w KQkq - 0 1"
        );
        assert_eq!(
            sanitize_fen("rnbqkbnr/pppppppp/8/8/8/8/8/8/8/8/8/8/8/8/8/8 w KQkq - 0 1"),
            "rnbqkbnr/pppppppp/8/8/8/8/8/8 w KQkq - 0 1"
        );
    }

    #[test]
    fn test_sanitize_fen_fills_missing_fields() {
        assert_eq!(sanitize_fen(starting_placement()), STARTING_POSITION);
        assert_eq!(sanitize_fen(""), EMPTY_POSITION);
        assert_eq!(sanitize_fen("8/8/8/8/8/8/8/8 b"), "8/8/8/8/8/8/8/8 b KQkq - 0 1");
    }

    #[test]
    fn test_sanitize_fen_is_idempotent() {
        for input in [
            "",
            "banana",
            "2p/2kp/1Q/P",
            "rnbqkbnr/pppppppp/8/8 w KQkq - 0 1",
            "123/pppppppppppp x KQ e9 -1 0",
            STARTING_POSITION,
            KINGS_PAWN_OPENING,
            "   ",
            "😎/k",
        ] {
            let once = sanitize_fen(input);
            assert_eq!(sanitize_fen(&once), once, "{input:?}");
            assert!(is_fen_valid(&once), "{once}");
        }
    }

    #[test]
    fn test_fen_positions_equal() {
        assert!(fen_positions_equal(STARTING_POSITION, STARTING_POSITION));
        assert!(fen_positions_equal(starting_placement(), STARTING_POSITION));
        assert!(fen_positions_equal("8/8/8/8/8/8/8/8 b - - 0 1", EMPTY_POSITION));
        assert!(!fen_positions_equal(EMPTY_POSITION, STARTING_POSITION));
    }

    #[test]
    fn test_is_fen_valid() {
        assert!(is_fen_valid(STARTING_POSITION));
        assert!(is_fen_valid(EMPTY_POSITION));
        assert!(!is_fen_valid(starting_placement()));
        assert!(!is_fen_valid("banana"));
        assert!(!is_fen_valid("2p1/2kp/1Q2/P3 w - - 0 1"));
        assert!(is_fen_valid("4k3/8/8/8/6R1/8/8/4K3 b K - 0 1"));
        assert!(!is_fen_valid("rnbqkbnr/pppppppp/44/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
        assert!(!is_fen_valid("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"));
        assert!(!is_fen_valid("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1"));
        assert!(!is_fen_valid("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0"));
    }

    #[test]
    fn test_normalize_fen() {
        assert_eq!(normalize_fen(STARTING_POSITION).as_deref(), Some(STARTING_POSITION));
        assert_eq!(
            normalize_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR   w KQkq -  0 1").as_deref(),
            Some(STARTING_POSITION)
        );
        assert_eq!(normalize_fen(starting_placement()), None);
        assert_eq!(normalize_fen("banana"), None);
    }

    #[test]
    fn test_is_fen_line() {
        assert!(is_fen_line(STARTING_POSITION));
        assert!(is_fen_line(starting_placement()));
        assert!(is_fen_line("2p/2kp/1Q/P"));
        assert!(is_fen_line("2p1/2kp/1Q2/P3 w - - 0 1"));
        assert!(!is_fen_line(""));
        assert!(!is_fen_line("b4 e5 Bb2 Nc6"));
        assert!(!is_fen_line("Bb5"));
        assert!(!is_fen_line("1. e4 e5"));
        assert!(!is_fen_line("2p/2kp/1Q/P w"));
        assert!(!is_fen_line("2p/2kp/1Q/P x - - 0 1"));
    }

    #[test]
    fn test_starting_player() {
        assert!(matches!(
            starting_player(starting_placement()),
            Err(ChessError::MissingField { .. })
        ));
        assert_eq!(starting_player(STARTING_POSITION).unwrap(), Player::White);
        assert_eq!(starting_player(KINGS_PAWN_OPENING).unwrap(), Player::Black);
    }

    #[test]
    fn test_set_fen_starting_player() {
        assert!(set_fen_starting_player("banana", Player::White).is_err());
        assert_eq!(
            set_fen_starting_player(STARTING_POSITION, Player::White).unwrap(),
            STARTING_POSITION
        );
        assert_eq!(
            set_fen_starting_player(STARTING_POSITION, Player::Black).unwrap(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(
            set_fen_starting_player(KINGS_PAWN_OPENING, Player::White).unwrap(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1"
        );
    }

    #[test]
    fn test_fen_can_castle() {
        assert!(fen_can_castle("banana", Player::White, CastlingSide::Kingside).is_err());
        for player in Player::ALL {
            for side in CastlingSide::ALL {
                assert!(fen_can_castle(STARTING_POSITION, player, side).unwrap());
                assert!(!fen_can_castle(CAPTURE_POSITION, player, side).unwrap());
            }
        }
    }

    #[test]
    fn test_set_fen_can_castle_revokes() {
        assert!(
            set_fen_can_castle("banana", Player::White, CastlingSide::Kingside, true).is_err()
        );
        assert_eq!(
            set_fen_can_castle(STARTING_POSITION, Player::White, CastlingSide::Kingside, false)
                .unwrap(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Qkq - 0 1"
        );
        assert_eq!(
            set_fen_can_castle(STARTING_POSITION, Player::Black, CastlingSide::Queenside, false)
                .unwrap(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQk - 0 1"
        );
        assert_eq!(
            set_fen_can_castle(CAPTURE_POSITION, Player::White, CastlingSide::Kingside, false)
                .unwrap(),
            CAPTURE_POSITION
        );
    }

    #[test]
    fn test_set_fen_can_castle_grants() {
        assert_eq!(
            set_fen_can_castle(CAPTURE_POSITION, Player::White, CastlingSide::Kingside, true)
                .unwrap(),
            "4k3/8/8/8/6R1/8/8/4K3 b K - 0 1"
        );
        assert_eq!(
            set_fen_can_castle(CAPTURE_POSITION, Player::Black, CastlingSide::Queenside, true)
                .unwrap(),
            "4k3/8/8/8/6R1/8/8/4K3 b q - 0 1"
        );
        assert_eq!(
            set_fen_can_castle(STARTING_POSITION, Player::White, CastlingSide::Kingside, true)
                .unwrap(),
            STARTING_POSITION
        );
    }

    #[test]
    fn test_set_fen_can_castle_collapses_to_dash() {
        let mut fen = STARTING_POSITION.to_string();
        for player in Player::ALL {
            for side in CastlingSide::ALL {
                fen = set_fen_can_castle(&fen, player, side, false).unwrap();
            }
        }
        assert_eq!(fen, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1");
    }
}
