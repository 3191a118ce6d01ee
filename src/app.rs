//! Command line front end: reads one content block and prints what a
//! renderer needs as JSON.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use fenboard::domain::{Indices, SquareColor, orient_indices, reverse_y_index, square_color};
use fenboard::{ChessResult, Content, Player, Square, parse_content};

#[derive(Parser, Debug)]
#[command(version, about = "Turn a FEN diagram or PGN game block into render-ready JSON")]
pub struct Args {
    /// Content file; standard input when omitted
    pub path: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Print the JSON Schema of the output instead
    #[arg(long)]
    pub schema: bool,

    /// Add display coordinates for every square, seen from this side
    #[arg(long, value_enum)]
    pub orientation: Option<Orientation>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Orientation {
    White,
    Black,
}

impl From<Orientation> for Player {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::White => Player::White,
            Orientation::Black => Player::Black,
        }
    }
}

/// Where a square is drawn, counted from the top-left corner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DisplaySquare {
    pub square: Square,
    pub x: usize,
    pub y: usize,
    pub color: SquareColor,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Output {
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squares: Option<Vec<DisplaySquare>>,
}

fn display_indices(indices: Indices, orientation: Player) -> ChessResult<Indices> {
    reverse_y_index(orient_indices(indices, orientation)?)
}

pub fn display_squares(orientation: Player) -> ChessResult<Vec<DisplaySquare>> {
    Square::all()
        .map(|square| {
            let (x, y) = display_indices(square.indices(), orientation)?;
            Ok(DisplaySquare {
                square,
                x,
                y,
                color: square_color(square),
            })
        })
        .collect()
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading standard input")?;
            Ok(text)
        }
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

pub fn run(args: &Args) -> Result<()> {
    if args.schema {
        println!("{}", to_json(&schema_for!(Output), args.pretty)?);
        return Ok(());
    }

    let text = read_input(args.path.as_ref())?;
    let source = args
        .path
        .as_ref()
        .map_or_else(|| "standard input".to_string(), |p| p.display().to_string());
    let content = parse_content(&text).with_context(|| format!("invalid content in {source}"))?;

    let squares = args
        .orientation
        .map(|orientation| display_squares(orientation.into()))
        .transpose()?;

    println!("{}", to_json(&Output { content, squares }, args.pretty)?);
    Ok(())
}
