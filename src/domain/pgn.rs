//! PGN movetext tokenizer.
//!
//! Splits a PGN into header tags, main-line SAN tokens and the raw comment
//! text attached to each of them. Legality is not checked here; the
//! chessboard replays the tokens and rejects the game if one fails.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ChessError, ChessResult};

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*$"#).expect("header regex")
});
static MOVE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+").expect("move number regex"));

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// A main-line move token with the comments that follow it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PgnMove {
    pub san: String,
    pub comment: Option<String>,
}

/// A tokenized game
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PgnGame {
    /// Tag pairs in file order
    pub headers: Vec<(String, String)>,
    /// Comment before the first move; it annotates the starting position
    pub comment: Option<String>,
    pub moves: Vec<PgnMove>,
    pub result: Option<String>,
}

impl PgnGame {
    /// Value of the first header tag called `name`
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The custom setup from a `[FEN "..."]` tag
    pub fn starting_fen(&self) -> Option<&str> {
        self.header("FEN")
    }

    fn attach_comment(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match self.moves.last_mut() {
            Some(last) => &mut last.comment,
            None => &mut self.comment,
        };
        match slot {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn is_token_end(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | '[' | ']' | ';')
}

/// Tokenize a PGN.
///
/// Variations are skipped, NAGs and move numbers dropped. Empty input is an
/// empty game.
pub fn parse_pgn(text: &str) -> ChessResult<PgnGame> {
    // `%` in the first column escapes the whole line
    let text: String = text
        .lines()
        .filter(|line| !line.starts_with('%'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut game = PgnGame::default();
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                let mut tag = String::new();
                let mut in_quotes = false;
                let mut escaped = false;
                loop {
                    let Some(c) = chars.next() else {
                        return Err(ChessError::invalid_pgn("unterminated header tag"));
                    };
                    if c == ']' && !in_quotes {
                        break;
                    }
                    if c == '"' && !escaped {
                        in_quotes = !in_quotes;
                    }
                    escaped = c == '\\' && !escaped;
                    tag.push(c);
                }
                let caps = HEADER_REGEX
                    .captures(&tag)
                    .ok_or_else(|| ChessError::invalid_pgn(format!("malformed header [{tag}]")))?;
                game.headers.push((caps[1].to_string(), unescape(&caps[2])));
            }
            '{' => {
                chars.next();
                let mut comment = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => comment.push(c),
                        None => return Err(ChessError::invalid_pgn("unterminated comment")),
                    }
                }
                if depth == 0 {
                    game.attach_comment(&comment);
                }
            }
            ';' => {
                let comment: String = chars.by_ref().skip(1).take_while(|&c| c != '\n').collect();
                if depth == 0 {
                    game.attach_comment(&comment);
                }
            }
            '(' => {
                chars.next();
                depth += 1;
            }
            ')' => {
                chars.next();
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ChessError::invalid_pgn("unexpected ')'"))?;
            }
            '}' | ']' => {
                return Err(ChessError::invalid_pgn(format!("unexpected '{c}'")));
            }
            _ => {
                let mut token = String::new();
                while let Some(&c) = chars.peek() {
                    if is_token_end(c) {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                if depth == 0 {
                    push_token(&mut game, &token);
                }
            }
        }
    }

    if depth > 0 {
        return Err(ChessError::invalid_pgn("unterminated variation"));
    }

    Ok(game)
}

fn push_token(game: &mut PgnGame, token: &str) {
    if RESULTS.contains(&token) {
        game.result = Some(token.to_string());
        return;
    }
    if token.starts_with('$') {
        return;
    }

    let san = MOVE_NUMBER_REGEX.replace(token, "");
    // Standalone glyphs such as `!?` written apart from the move
    if san.is_empty() || san.chars().all(|c| c == '!' || c == '?') {
        return;
    }

    game.moves.push(PgnMove {
        san: san.into_owned(),
        comment: None,
    });
}
