//! Annotation micro-formats found in comments.
//!
//! Two independent parsers live here:
//!
//! - [`parse_comment`] reads PGN move comments, pulling highlight and arrow
//!   directives out of `[%...]` tags and keeping the rest as plain text.
//! - [`parse_shorthand`] reads the lines after a FEN in a diagram block:
//!   `Ge4` highlights, `Re2e4` arrows, a `6x6` board size and a
//!   `{caption}`.
//!
//! Neither parser fails. Anything unrecognised is left alone.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::chess::{Arrow, Color, Highlight};
use super::squares::Square;

/// Highlight colours by keyboard modifier, matching chess.com defaults
const HIGHLIGHT_MODIFIER_COLORS: [(&str, Color); 4] = [
    ("none", Color::Red),
    ("alt", Color::Blue),
    ("ctrl", Color::Yellow),
    ("shift", Color::Green),
];

/// Arrow colours by keyboard modifier. Differs from highlights on purpose.
const ARROW_MODIFIER_COLORS: [(&str, Color); 4] = [
    ("none", Color::Yellow),
    ("alt", Color::Blue),
    ("ctrl", Color::Red),
    ("shift", Color::Green),
];

const LETTER_COLORS: [(char, Color); 4] = [
    ('R', Color::Red),
    ('G', Color::Green),
    ('B', Color::Blue),
    ('Y', Color::Yellow),
];

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%(\w+)\s*([^\]]*)\]").expect("tag regex"));
static LETTER_HIGHLIGHT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([RGBY])([a-h][1-8])\b").expect("highlight regex"));
static LETTER_ARROW_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([RGBY])([a-h][1-8])([a-h][1-8])\b").expect("arrow regex")
});
static SIZE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-8])x([1-8])\b").expect("size regex"));
static CAPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]*)\}").expect("caption regex"));

/// Comment text and drawings attached to one position
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Annotations {
    pub comment: Option<String>,
    pub highlights: Vec<Highlight>,
    pub arrows: Vec<Arrow>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none() && self.highlights.is_empty() && self.arrows.is_empty()
    }
}

/// Everything found in the text following a diagram FEN
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shorthand {
    /// `(files, ranks)` from a `WxH` token
    pub board_size: Option<(usize, usize)>,
    pub highlights: Vec<Highlight>,
    pub arrows: Vec<Arrow>,
    pub caption: Option<String>,
}

fn modifier_color(table: &[(&str, Color)], modifier: &str) -> Option<Color> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(modifier))
        .map(|(_, color)| *color)
}

fn letter_color(letter: &str) -> Option<Color> {
    let letter = letter.chars().next()?;
    LETTER_COLORS
        .iter()
        .find(|(c, _)| *c == letter)
        .map(|(_, color)| *color)
}

/// Split `e2e4` into two squares
fn square_pair(text: &str) -> Option<(Square, Square)> {
    if text.len() != 4 || !text.is_ascii() {
        return None;
    }
    Some((text[..2].parse().ok()?, text[2..].parse().ok()?))
}

/// Value following `key` in a `key;value;key;value` list
fn field_after<'a>(fields: &[&'a str], key: &str) -> Option<&'a str> {
    fields
        .windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case(key))
        .map(|pair| pair[1])
}

/// One entry of a `[%c_highlight ...]` list: `e4;keyPressed;alt;...`
fn modifier_highlight(entry: &str) -> Option<Highlight> {
    let fields: Vec<&str> = entry.split(';').map(str::trim).collect();
    let square = match field_after(&fields, "square") {
        Some(square) => square.parse().ok()?,
        None => fields.first()?.parse().ok()?,
    };
    let modifier = field_after(&fields, "keyPressed").unwrap_or("none");
    Some(Highlight {
        color: modifier_color(&HIGHLIGHT_MODIFIER_COLORS, modifier)?,
        square,
    })
}

/// One entry of a `[%c_arrow ...]` list: `e2e4;keyPressed;none;...` or
/// `e2;e4;keyPressed;none;...`
fn modifier_arrow(entry: &str) -> Option<Arrow> {
    let fields: Vec<&str> = entry.split(';').map(str::trim).collect();
    let explicit = field_after(&fields, "from").zip(field_after(&fields, "to"));

    let (from, to) = match explicit {
        Some((from, to)) => (from.parse().ok()?, to.parse().ok()?),
        None => match square_pair(fields.first()?) {
            Some(pair) => pair,
            None => (fields.first()?.parse().ok()?, fields.get(1)?.parse().ok()?),
        },
    };

    let modifier = field_after(&fields, "keyPressed").unwrap_or("none");
    Some(Arrow {
        color: modifier_color(&ARROW_MODIFIER_COLORS, modifier)?,
        from,
        to,
    })
}

/// `Ge4` as used by `[%csl ...]`
fn letter_highlight(entry: &str) -> Option<Highlight> {
    let entry = entry.trim();
    if entry.len() != 3 || !entry.is_ascii() {
        return None;
    }
    Some(Highlight {
        color: letter_color(&entry[..1])?,
        square: entry[1..].parse().ok()?,
    })
}

/// `Ge2e4` as used by `[%cal ...]`
fn letter_arrow(entry: &str) -> Option<Arrow> {
    let entry = entry.trim();
    if entry.len() != 5 || !entry.is_ascii() {
        return None;
    }
    let (from, to) = square_pair(&entry[1..])?;
    Some(Arrow {
        color: letter_color(&entry[..1])?,
        from,
        to,
    })
}

/// Parse a raw PGN comment.
///
/// Every `[%tag ...]` is removed from the text. Highlight and arrow tags
/// contribute their entries; malformed entries are dropped. What remains,
/// trimmed, is the comment, or `None` if nothing does.
pub fn parse_comment(raw: &str) -> Annotations {
    let mut annotations = Annotations::default();

    for caps in TAG_REGEX.captures_iter(raw) {
        let body = &caps[2];
        let entries = body.split(',').filter(|entry| !entry.trim().is_empty());
        match &caps[1] {
            "c_highlight" => annotations
                .highlights
                .extend(entries.filter_map(modifier_highlight)),
            "c_arrow" => annotations.arrows.extend(entries.filter_map(modifier_arrow)),
            "csl" => annotations
                .highlights
                .extend(entries.filter_map(letter_highlight)),
            "cal" => annotations.arrows.extend(entries.filter_map(letter_arrow)),
            _ => {}
        }
    }

    let text = TAG_REGEX.replace_all(raw, "");
    let text = text.trim();
    if !text.is_empty() {
        annotations.comment = Some(text.to_string());
    }

    annotations
}

/// Parse shorthand directives from the text under a diagram FEN
pub fn parse_shorthand(text: &str) -> Shorthand {
    let caption = CAPTION_REGEX
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|caption| !caption.is_empty());
    let text = CAPTION_REGEX.replace_all(text, " ");

    let board_size = SIZE_REGEX.captures(&text).and_then(|caps| {
        let files = caps[1].parse().ok()?;
        let ranks = caps[2].parse().ok()?;
        Some((files, ranks))
    });

    let arrows = LETTER_ARROW_REGEX
        .captures_iter(&text)
        .filter_map(|caps| {
            Some(Arrow {
                color: letter_color(&caps[1])?,
                from: caps[2].parse().ok()?,
                to: caps[3].parse().ok()?,
            })
        })
        .collect();

    let highlights = LETTER_HIGHLIGHT_REGEX
        .captures_iter(&text)
        .filter_map(|caps| {
            Some(Highlight {
                color: letter_color(&caps[1])?,
                square: caps[2].parse().ok()?,
            })
        })
        .collect();

    Shorthand {
        board_size,
        highlights,
        arrows,
        caption,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn highlight(color: Color, square: &str) -> Highlight {
        Highlight {
            color,
            square: sq(square),
        }
    }

    fn arrow(color: Color, from: &str, to: &str) -> Arrow {
        Arrow {
            color,
            from: sq(from),
            to: sq(to),
        }
    }

    #[test]
    fn test_plain_comment() {
        let annotations = parse_comment("  The main line  ");
        assert_eq!(annotations.comment.as_deref(), Some("The main line"));
        assert!(annotations.highlights.is_empty());
        assert!(annotations.arrows.is_empty());
    }

    #[test]
    fn test_tags_only_comment_is_none() {
        let annotations = parse_comment("[%clk 0:03:00] [%eval 0.17]");
        assert_eq!(annotations, Annotations::default());
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_modifier_highlights() {
        let annotations = parse_comment(
            "Pressure [%c_highlight e4;keyPressed;none;opacity;0.8,d5;keyPressed;alt,f6;keyPressed;ctrl,c3;keyPressed;shift]",
        );
        assert_eq!(annotations.comment.as_deref(), Some("Pressure"));
        assert_eq!(
            annotations.highlights,
            vec![
                highlight(Color::Red, "e4"),
                highlight(Color::Blue, "d5"),
                highlight(Color::Yellow, "f6"),
                highlight(Color::Green, "c3"),
            ]
        );
    }

    #[test]
    fn test_modifier_arrows_use_their_own_table() {
        let annotations = parse_comment(
            "[%c_arrow e2e4;keyPressed;none,g1;f3;keyPressed;ctrl,b1c3;keyPressed;alt,keyPressed;shift;from;d2;to;d4]",
        );
        assert_eq!(annotations.comment, None);
        assert_eq!(
            annotations.arrows,
            vec![
                arrow(Color::Yellow, "e2", "e4"),
                arrow(Color::Red, "g1", "f3"),
                arrow(Color::Blue, "b1", "c3"),
                arrow(Color::Green, "d2", "d4"),
            ]
        );
    }

    #[test]
    fn test_letter_tags() {
        let annotations = parse_comment("Ideas [%csl Ge4,Rd5] [%cal Ge2e4,Yg1f3] here");
        assert_eq!(annotations.comment.as_deref(), Some("Ideas   here"));
        assert_eq!(
            annotations.highlights,
            vec![highlight(Color::Green, "e4"), highlight(Color::Red, "d5")]
        );
        assert_eq!(
            annotations.arrows,
            vec![arrow(Color::Green, "e2", "e4"), arrow(Color::Yellow, "g1", "f3")]
        );
    }

    #[test]
    fn test_malformed_entries_are_dropped() {
        let annotations =
            parse_comment("[%c_highlight z9;keyPressed;none,e4;keyPressed;meta] [%csl Xe4,Gi9]");
        assert!(annotations.highlights.is_empty());
        assert_eq!(annotations.comment, None);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let annotations = parse_comment("[%csl Ge4,Ge4]");
        assert_eq!(annotations.highlights.len(), 2);
    }

    #[test]
    fn test_shorthand() {
        let shorthand = parse_shorthand("Ge4 Rd5\nBe2e4 6x5 {White to play}");
        assert_eq!(shorthand.board_size, Some((6, 5)));
        assert_eq!(shorthand.caption.as_deref(), Some("White to play"));
        assert_eq!(
            shorthand.highlights,
            vec![highlight(Color::Green, "e4"), highlight(Color::Red, "d5")]
        );
        assert_eq!(shorthand.arrows, vec![arrow(Color::Blue, "e2", "e4")]);
    }

    #[test]
    fn test_shorthand_ignores_caption_text() {
        let shorthand = parse_shorthand("{Ge4 is the key square} Yc3");
        assert_eq!(shorthand.caption.as_deref(), Some("Ge4 is the key square"));
        assert_eq!(shorthand.highlights, vec![highlight(Color::Yellow, "c3")]);
        assert_eq!(shorthand.board_size, None);
    }

    #[test]
    fn test_shorthand_empty() {
        assert_eq!(parse_shorthand(""), Shorthand::default());
        assert_eq!(parse_shorthand("just words").caption, None);
    }
}
