//! Stateful layer: the rules engine adapter, the chessboard built on it and
//! the content-block consumer.

pub mod content;
pub mod game;
pub mod rules;

pub use content::{Content, Diagram, parse_content};
pub use game::{AnnotatedPosition, Chessboard, GameView, Move, Position};
pub use rules::{AppliedMove, DefaultRules, PieceOnSquare, RulesEngine, ShakmatyRules};
